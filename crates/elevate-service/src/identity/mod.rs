//! Identity gateway: typed calls into the external identity provider.
//!
//! The provider is the system of record for credentials and bearer tokens.
//! This crate never stores passwords; it only asks the provider to invite,
//! delete, verify and set credentials.
//!
//! ## Module Organization
//!
//! - `gotrue`: HTTP client for a GoTrue-compatible provider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use elevate_db::model::user::Role;

pub mod gotrue;

pub use gotrue::GoTrueGateway;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Bearer or activation token is unknown, expired or already used.
    #[error("token rejected by identity provider")]
    InvalidToken,

    #[error("identity not found")]
    NotFound,

    #[error("email already registered with identity provider")]
    EmailExists,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("password rejected by identity provider: {0}")]
    WeakPassword(String),

    #[error("identity provider rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("identity provider unreachable: {0}")]
    Transport(String),

    #[error("identity provider timed out")]
    Timeout,

    #[error("unexpected identity provider response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Message safe to return to the actor.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidToken => "Token is invalid or expired",
            Self::NotFound => "Identity not found",
            Self::EmailExists => "An account with this email already exists",
            Self::InvalidCredentials => "Invalid email or password",
            Self::WeakPassword(_) => "Password does not satisfy the provider's policy",
            Self::Rejected { .. } => "The identity provider rejected the request",
            Self::Transport(_) | Self::Decode(_) => "The identity provider is unavailable",
            Self::Timeout => "The identity provider did not respond in time",
        }
    }

    /// Failures worth another attempt with the same input.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout)
            || matches!(self, Self::Rejected { status, .. } if *status >= 500)
    }
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Metadata attached to an invited identity.
///
/// `invited_by` marks identities created through the invitation flow; the
/// reconciliation sweep only touches identities that carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteMetadata {
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<uuid::Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invited_by: Option<uuid::Uuid>,
}

/// An identity as listed by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: uuid::Uuid,
    pub email: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// `None` when the provider metadata is absent or not ours.
    pub metadata: Option<InviteMetadata>,
}

/// An authenticated session issued by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    pub user_id: uuid::Uuid,
}

#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Resolves an actor bearer token to its subject id.
    async fn resolve_token(&self, token: &str) -> GatewayResult<uuid::Uuid>;

    /// Creates a pending identity and triggers the provider's activation email.
    async fn invite_identity(
        &self,
        email: &str,
        metadata: &InviteMetadata,
    ) -> GatewayResult<uuid::Uuid>;

    async fn delete_identity(&self, subject: uuid::Uuid) -> GatewayResult<()>;

    async fn list_identities(&self) -> GatewayResult<Vec<Identity>>;

    /// Consumes a single-use activation token and returns the session it grants.
    async fn verify_activation(&self, token: &str) -> GatewayResult<Session>;

    async fn set_credential(&self, session: &Session, password: &str) -> GatewayResult<()>;

    async fn sign_in(&self, email: &str, password: &str) -> GatewayResult<Session>;
}
