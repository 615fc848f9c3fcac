//! Invitation service.
//!
//! An invitation spans two systems: the identity provider creates a pending
//! identity (phase 1), then the profile store records the account under the
//! provider's subject id (phase 2). Phase 2 is retried with the same subject
//! id. A lost race on the email or id constraint is reported as a duplicate,
//! and the identity is deleted again unless a profile references it. A
//! profile write that never succeeds is left for
//! [`reconcile::sweep`](crate::reconcile::sweep).

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::SubsecRound;
use serde::{Deserialize, Serialize};

use elevate_core::util::email::normalize_email;
use elevate_db::error::{DbError, UniqueField};
use elevate_db::model::user::{NewUser, Role};

use crate::auth::authenticate;
use crate::context::ServiceDeps;
use crate::error::{ServiceError, ServiceResult};
use crate::guard::{provider_call, retry_with_backoff, store_call};
use crate::identity::{GatewayError, InviteMetadata};
use crate::organization::resolve_scope;
use crate::policy::Action;

/// Longest accepted display name, in characters.
const MAX_NAME_CHARS: usize = 100;

/// Input of an invitation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InviteRequest {
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Target organization; only creators may name one.
    #[serde(default)]
    pub organization_id: Option<uuid::Uuid>,
}

/// Result of a completed invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InviteOutcome {
    pub user_id: uuid::Uuid,
    pub role: Role,
    pub organization_id: Option<uuid::Uuid>,
}

/// ## Summary
/// Invites a new account: creates a pending identity at the provider, then
/// the matching profile row.
///
/// ## Side Effects
/// - Creates an identity at the provider, which emails an activation link
/// - Inserts a `users` row keyed by the new subject id
/// - On a lost email race, deletes the identity it just created unless a
///   profile already references it
///
/// ## Errors
/// - `Unauthenticated` if the token does not resolve to an actor
/// - `Validation` if name, email or role are malformed
/// - `Unauthorized` if the actor's role may not invite `role`
/// - `DuplicateEmail` if the email is already registered
/// - `Provider` if identity creation fails (no profile is written)
/// - `Persistence` if the profile cannot be written; the identity is then
///   left for the reconciliation sweep
#[tracing::instrument(skip(deps, token, request), fields(role = %request.role))]
pub async fn invite(
    deps: &ServiceDeps,
    token: &str,
    request: InviteRequest,
) -> ServiceResult<InviteOutcome> {
    let actor = authenticate(deps, token).await?;

    if !request.role.is_invitable() {
        return Err(ServiceError::Validation(format!(
            "Role '{}' cannot be invited",
            request.role
        )));
    }
    deps.policy
        .require(actor.role(), Action::Invite, Some(request.role))?;

    let name = validate_name(&request.name)?;
    let email = normalize_email(&request.email)?;
    let scope = resolve_scope(deps, &actor, request.organization_id).await?;

    let limits = &deps.limits;
    if store_call(limits.store_timeout, deps.store.find_user_by_email(&email))
        .await?
        .is_some()
    {
        tracing::debug!(email = %email, "Invitation rejected; email already has a profile");
        return Err(ServiceError::DuplicateEmail(format!(
            "An account with email {email} already exists"
        )));
    }

    // Phase 1: identity.
    let metadata = InviteMetadata {
        name: name.clone(),
        role: request.role,
        organization_id: scope.organization_id(),
        invited_by: Some(actor.id()),
    };
    let subject = match provider_call(
        limits.identity_timeout,
        deps.identity.invite_identity(&email, &metadata),
    )
    .await
    {
        Ok(subject) => subject,
        Err(GatewayError::EmailExists) => {
            return Err(ServiceError::DuplicateEmail(format!(
                "An account with email {email} already exists"
            )));
        }
        Err(e) => return Err(e.into()),
    };
    tracing::debug!(subject = %subject, "Identity created; writing profile");

    // Phase 2: profile, keyed by the subject id from phase 1.
    let new_user = NewUser {
        id: subject,
        name,
        email,
        role: request.role,
        organization_id: scope.organization_id(),
        created_at: chrono::Utc::now().trunc_subsecs(6),
    };

    match write_profile(deps, &new_user).await {
        Ok(()) => {
            tracing::info!(
                user_id = %subject,
                invited_by = %actor.id(),
                role = %new_user.role,
                "Account invited"
            );
            Ok(InviteOutcome {
                user_id: subject,
                role: new_user.role,
                organization_id: new_user.organization_id,
            })
        }
        Err(DbError::UniqueViolation(UniqueField::Email)) => {
            compensate(deps, subject).await;
            Err(ServiceError::DuplicateEmail(format!(
                "An account with email {} already exists",
                new_user.email
            )))
        }
        Err(DbError::UniqueViolation(UniqueField::Id)) => {
            // The provider handed out a subject that already has a profile.
            tracing::warn!(user_id = %subject, "Subject id already holds a profile; invitation rejected");
            Err(ServiceError::DuplicateEmail(format!(
                "An account with email {} already exists",
                new_user.email
            )))
        }
        Err(e) => {
            tracing::error!(
                user_id = %subject,
                email = %new_user.email,
                error = %e,
                "Profile write failed after identity creation; left for reconciliation"
            );
            Err(ServiceError::Persistence(format!(
                "The account identity {subject} was created but its profile could not be saved; \
                 it will be completed or removed by reconciliation"
            )))
        }
    }
}

/// Inserts the profile with retries.
///
/// An id conflict counts as success only when an earlier attempt failed
/// without an answer and the stored row is field-for-field this insert.
/// Any other id conflict means another invitation already holds the
/// subject id.
async fn write_profile(deps: &ServiceDeps, new_user: &NewUser) -> Result<(), DbError> {
    let limits = &deps.limits;
    let unanswered = AtomicBool::new(false);

    let result = retry_with_backoff(
        limits.write_attempts,
        limits.retry_base_delay,
        "insert_profile",
        |e: &DbError| {
            let retryable = !matches!(
                e,
                DbError::UniqueViolation(_) | DbError::ForeignKeyViolation(_) | DbError::CoreError(_)
            );
            if retryable {
                unanswered.store(true, Ordering::SeqCst);
            }
            retryable
        },
        || store_call(limits.store_timeout, deps.store.insert_user(new_user)),
    )
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(DbError::UniqueViolation(UniqueField::Id)) if unanswered.load(Ordering::SeqCst) => {
            let existing =
                store_call(limits.store_timeout, deps.store.find_user(new_user.id)).await?;
            match existing {
                Some(row) if new_user.matches(&row) => {
                    tracing::debug!(user_id = %new_user.id, "Profile already written by an earlier attempt");
                    Ok(())
                }
                _ => Err(DbError::UniqueViolation(UniqueField::Id)),
            }
        }
        Err(e) => Err(e),
    }
}

/// Deletes an identity whose profile lost the email race. A failure here is
/// logged; the reconciliation sweep discards the identity later because its
/// email belongs to another profile. An identity that a profile already
/// references is kept.
async fn compensate(deps: &ServiceDeps, subject: uuid::Uuid) {
    match store_call(deps.limits.store_timeout, deps.store.find_user(subject)).await {
        Ok(None) => {}
        Ok(Some(_)) => {
            tracing::info!(subject = %subject, "Identity belongs to the winning profile; not deleted");
            return;
        }
        Err(e) => {
            tracing::warn!(
                subject = %subject,
                error = %e,
                "Could not check identity ownership; left for reconciliation"
            );
            return;
        }
    }

    match provider_call(
        deps.limits.identity_timeout,
        deps.identity.delete_identity(subject),
    )
    .await
    {
        Ok(()) | Err(GatewayError::NotFound) => {
            tracing::info!(subject = %subject, "Duplicate invitation compensated; identity deleted");
        }
        Err(e) => {
            tracing::error!(
                subject = %subject,
                error = %e,
                "Failed to delete identity of duplicate invitation; left for reconciliation"
            );
        }
    }
}

fn validate_name(name: &str) -> ServiceResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::Validation("Name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(ServiceError::Validation(format!(
            "Name must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(name.to_string())
}
