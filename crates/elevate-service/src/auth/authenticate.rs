use crate::context::ServiceDeps;
use crate::error::{ServiceError, ServiceResult};
use crate::guard::{provider_call, store_call};
use crate::identity::GatewayError;

use super::Actor;

/// ## Summary
/// Resolves a bearer token to an actor: the provider maps the token to a
/// subject id, the profile store supplies the subject's role.
///
/// ## Errors
/// - `Unauthenticated` if the token is empty, rejected by the provider, or
///   the subject has no profile
/// - `Provider` / `Persistence` if a collaborator fails or times out
#[tracing::instrument(skip_all)]
pub async fn authenticate(deps: &ServiceDeps, token: &str) -> ServiceResult<Actor> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ServiceError::Unauthenticated(
            "Missing bearer token".to_string(),
        ));
    }

    let subject = match provider_call(
        deps.limits.identity_timeout,
        deps.identity.resolve_token(token),
    )
    .await
    {
        Ok(subject) => subject,
        Err(GatewayError::InvalidToken | GatewayError::NotFound) => {
            tracing::debug!("Bearer token rejected by identity provider");
            return Err(ServiceError::Unauthenticated(
                "Token is invalid or expired".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    let Some(user) = store_call(deps.limits.store_timeout, deps.store.find_user(subject)).await?
    else {
        tracing::warn!(subject = %subject, "Authenticated subject has no profile");
        return Err(ServiceError::Unauthenticated(
            "No profile exists for this account".to_string(),
        ));
    };

    tracing::debug!(user_id = %user.id, role = %user.role, "Actor authenticated");
    Ok(Actor { user })
}
