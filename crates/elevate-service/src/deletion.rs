//! Deletion service.
//!
//! The identity goes first so the account cannot sign in anymore even if the
//! profile delete later fails. This is the only code path that removes
//! profile rows.

use serde::Serialize;

use elevate_db::error::DbError;
use elevate_db::model::user::Role;

use crate::auth::authenticate;
use crate::context::ServiceDeps;
use crate::error::{ServiceError, ServiceResult};
use crate::guard::{provider_call, retry_with_backoff, store_call};
use crate::identity::GatewayError;
use crate::policy::Action;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub user_id: uuid::Uuid,
    pub role: Role,
}

/// ## Summary
/// Deletes an account: identity at the provider, then the profile row.
///
/// ## Side Effects
/// - Deletes the identity; the target can no longer authenticate
/// - Deletes the `users` row (and with it a creator's cursor row)
///
/// ## Errors
/// - `Unauthenticated` if the token does not resolve to an actor
/// - `NotFound` if no profile has `target_id` (nothing is mutated)
/// - `Unauthorized` if the target belongs to another organization and the
///   actor is not a creator, or the actor's role may not delete the target's role
/// - `Validation` if the actor targets their own account
/// - `Provider` if the identity cannot be deleted (profile untouched)
/// - `Persistence` if the profile delete does not converge after the
///   identity is gone
#[tracing::instrument(skip(deps, token), fields(target_id = %target_id))]
pub async fn delete(
    deps: &ServiceDeps,
    token: &str,
    target_id: uuid::Uuid,
) -> ServiceResult<DeleteOutcome> {
    let actor = authenticate(deps, token).await?;
    let limits = &deps.limits;

    let target = store_call(limits.store_timeout, deps.store.find_user(target_id))
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("No account with id {target_id}")))?;

    if target.id == actor.id() {
        return Err(ServiceError::Validation(
            "You cannot delete your own account".to_string(),
        ));
    }
    if actor.role() != Role::Creator && target.organization_id != actor.organization_id() {
        tracing::warn!(
            user_id = %actor.id(),
            target_id = %target.id,
            "Cross-organization deletion denied"
        );
        return Err(ServiceError::Unauthorized(
            "Only creators may act on other organizations".to_string(),
        ));
    }
    deps.policy
        .require(actor.role(), Action::Delete, Some(target.role))?;

    match provider_call(
        limits.identity_timeout,
        deps.identity.delete_identity(target.id),
    )
    .await
    {
        Ok(()) => {}
        Err(GatewayError::NotFound) => {
            tracing::warn!(user_id = %target.id, "Identity already absent; removing profile");
        }
        Err(e) => return Err(e.into()),
    }

    let removed = retry_with_backoff(
        limits.write_attempts,
        limits.retry_base_delay,
        "delete_profile",
        |e: &DbError| !matches!(e, DbError::CoreError(_)),
        || store_call(limits.store_timeout, deps.store.delete_user(target.id)),
    )
    .await;

    match removed {
        Ok(found) => {
            if !found {
                tracing::debug!(user_id = %target.id, "Profile was removed concurrently");
            }
            tracing::info!(
                user_id = %target.id,
                role = %target.role,
                deleted_by = %actor.id(),
                "Account deleted"
            );
            Ok(DeleteOutcome {
                user_id: target.id,
                role: target.role,
            })
        }
        Err(e) => {
            tracing::error!(
                user_id = %target.id,
                email = %target.email,
                error = %e,
                "Identity deleted but profile row remains; manual reconciliation required"
            );
            Err(ServiceError::Persistence(format!(
                "The account {} can no longer sign in, but its profile could not be removed; \
                 it has been logged for manual cleanup",
                target.id
            )))
        }
    }
}
