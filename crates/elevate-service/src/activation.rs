//! Activation completion service.

use serde::Deserialize;

use crate::context::ServiceDeps;
use crate::error::{ServiceError, ServiceResult};
use crate::guard::{provider_call, retry_with_backoff};
use crate::identity::{GatewayError, Session};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActivationRequest {
    pub activation_token: String,
    pub password: String,
}

/// ## Summary
/// Sets the first credential of an invited account using the single-use
/// activation token from the provider's email, and returns the session the
/// token grants.
///
/// The password is checked before the token is presented, so a rejected
/// password leaves the token usable.
///
/// ## Side Effects
/// - Consumes the activation token at the provider
/// - Sets the identity's password
///
/// ## Errors
/// - `InvalidToken` if the token is empty, unknown, expired or already used
/// - `WeakPassword` if the password is shorter than the configured minimum
///   or the provider rejects it
/// - `Provider` if the provider fails or times out
#[tracing::instrument(skip_all)]
pub async fn complete_activation(
    deps: &ServiceDeps,
    request: ActivationRequest,
) -> ServiceResult<Session> {
    let token = request.activation_token.trim();
    if token.is_empty() {
        return Err(ServiceError::InvalidToken(
            "Activation token is required".to_string(),
        ));
    }
    check_password(&request.password, deps.limits.min_password_length)?;

    let limits = &deps.limits;
    let session = match provider_call(
        limits.identity_timeout,
        deps.identity.verify_activation(token),
    )
    .await
    {
        Ok(session) => session,
        Err(GatewayError::InvalidToken | GatewayError::NotFound) => {
            tracing::debug!("Activation token rejected");
            return Err(ServiceError::InvalidToken(
                "Activation link is invalid, expired or already used".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    // The token is spent; only the credential write is retried.
    let result = retry_with_backoff(
        limits.write_attempts,
        limits.retry_base_delay,
        "set_credential",
        GatewayError::is_transient,
        || {
            provider_call(
                limits.identity_timeout,
                deps.identity.set_credential(&session, &request.password),
            )
        },
    )
    .await;

    match result {
        Ok(()) => {
            tracing::info!(user_id = %session.user_id, "Account activated");
            Ok(session)
        }
        Err(GatewayError::WeakPassword(reason)) => Err(ServiceError::WeakPassword(reason)),
        Err(GatewayError::InvalidToken) => Err(ServiceError::InvalidToken(
            "Activation session expired before the password was set".to_string(),
        )),
        Err(e) => {
            tracing::error!(user_id = %session.user_id, error = %e, "Activation token consumed but password not set");
            Err(e.into())
        }
    }
}

fn check_password(password: &str, min_length: usize) -> ServiceResult<()> {
    if password.chars().count() < min_length {
        return Err(ServiceError::WeakPassword(format!(
            "Password must be at least {min_length} characters"
        )));
    }
    Ok(())
}
