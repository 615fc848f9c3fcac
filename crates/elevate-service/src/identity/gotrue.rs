//! HTTP client for a GoTrue-compatible identity provider (e.g. Supabase Auth).

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use elevate_core::config::IdentityConfig;

use super::{
    GatewayError, GatewayResult, Identity, IdentityGateway, InviteMetadata, Session,
};

const AUTH_PATH: &str = "auth/v1";
const LIST_PAGE_SIZE: usize = 200;

#[derive(Debug, Deserialize)]
struct UserBody {
    id: uuid::Uuid,
    email: Option<String>,
    created_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    user_metadata: serde_json::Value,
}

impl From<UserBody> for Identity {
    fn from(body: UserBody) -> Self {
        Self {
            id: body.id,
            email: body.email,
            // Without a timestamp the identity is treated as old enough to sweep.
            created_at: body.created_at.unwrap_or(chrono::DateTime::UNIX_EPOCH),
            metadata: serde_json::from_value::<InviteMetadata>(body.user_metadata).ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserListBody {
    users: Vec<UserBody>,
}

#[derive(Debug, Deserialize)]
struct SessionBody {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    user: UserBody,
}

impl From<SessionBody> for Session {
    fn from(body: SessionBody) -> Self {
        Self {
            access_token: body.access_token,
            refresh_token: body.refresh_token,
            expires_in: body.expires_in,
            user_id: body.user.id,
        }
    }
}

/// GoTrue reports errors in a few historical shapes; all fields are optional.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error_code: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl ErrorBody {
    fn message(&self) -> String {
        self.msg
            .as_deref()
            .or(self.message.as_deref())
            .or(self.error_description.as_deref())
            .or(self.error.as_deref())
            .unwrap_or("no message")
            .to_string()
    }
}

/// Which key authenticates a request.
enum Credential<'a> {
    /// Public key plus a user's own token.
    User(&'a str),
    /// Service-role key for admin endpoints.
    Service,
    /// Public key only.
    Anonymous,
}

#[derive(Clone)]
pub struct GoTrueGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    service_role_key: String,
}

impl GoTrueGateway {
    /// ## Summary
    /// Builds a client for the configured provider. Every request carries the
    /// configured timeout.
    ///
    /// ## Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &IdentityConfig) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            service_role_key: config.service_role_key.clone(),
        })
    }

    fn request(&self, method: Method, path: &str, credential: &Credential<'_>) -> RequestBuilder {
        let url = format!("{}/{AUTH_PATH}/{path}", self.base_url);
        let builder = self.client.request(method, url);

        match credential {
            Credential::User(token) => builder.header("apikey", &self.api_key).bearer_auth(token),
            Credential::Service => builder
                .header("apikey", &self.service_role_key)
                .bearer_auth(&self.service_role_key),
            Credential::Anonymous => builder
                .header("apikey", &self.api_key)
                .bearer_auth(&self.api_key),
        }
    }

    async fn send(builder: RequestBuilder) -> GatewayResult<Response> {
        builder.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout
            } else {
                GatewayError::Transport(e.to_string())
            }
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> GatewayResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }

    /// Reads the error body of a non-success response.
    async fn failure(response: Response) -> (StatusCode, ErrorBody) {
        let status = response.status();
        let body = response.json::<ErrorBody>().await.unwrap_or_default();
        tracing::debug!(
            status = %status,
            error_code = ?body.error_code,
            message = %body.message(),
            "Identity provider returned an error"
        );
        (status, body)
    }

    fn rejected(status: StatusCode, body: &ErrorBody) -> GatewayError {
        GatewayError::Rejected {
            status: status.as_u16(),
            message: body.message(),
        }
    }
}

#[async_trait]
impl IdentityGateway for GoTrueGateway {
    #[tracing::instrument(skip_all)]
    async fn resolve_token(&self, token: &str) -> GatewayResult<uuid::Uuid> {
        let response =
            Self::send(self.request(Method::GET, "user", &Credential::User(token))).await?;

        if response.status().is_success() {
            return Ok(Self::decode::<UserBody>(response).await?.id);
        }

        let (status, body) = Self::failure(response).await;
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(GatewayError::InvalidToken),
            StatusCode::NOT_FOUND => Err(GatewayError::NotFound),
            _ => Err(Self::rejected(status, &body)),
        }
    }

    #[tracing::instrument(skip(self, metadata), fields(role = %metadata.role))]
    async fn invite_identity(
        &self,
        email: &str,
        metadata: &InviteMetadata,
    ) -> GatewayResult<uuid::Uuid> {
        let response = Self::send(
            self.request(Method::POST, "invite", &Credential::Service)
                .json(&json!({ "email": email, "data": metadata })),
        )
        .await?;

        if response.status().is_success() {
            let user = Self::decode::<UserBody>(response).await?;
            tracing::debug!(subject = %user.id, "Identity invited");
            return Ok(user.id);
        }

        let (status, body) = Self::failure(response).await;
        let already_registered = body.error_code.as_deref() == Some("email_exists")
            || body.message().contains("already been registered");
        if already_registered {
            return Err(GatewayError::EmailExists);
        }
        Err(Self::rejected(status, &body))
    }

    #[tracing::instrument(skip(self))]
    async fn delete_identity(&self, subject: uuid::Uuid) -> GatewayResult<()> {
        let response = Self::send(self.request(
            Method::DELETE,
            &format!("admin/users/{subject}"),
            &Credential::Service,
        ))
        .await?;

        if response.status().is_success() {
            return Ok(());
        }

        let (status, body) = Self::failure(response).await;
        if status == StatusCode::NOT_FOUND || body.error_code.as_deref() == Some("user_not_found") {
            return Err(GatewayError::NotFound);
        }
        Err(Self::rejected(status, &body))
    }

    #[tracing::instrument(skip(self))]
    async fn list_identities(&self) -> GatewayResult<Vec<Identity>> {
        let mut identities = Vec::new();
        let mut page = 1_usize;

        loop {
            let path = format!("admin/users?page={page}&per_page={LIST_PAGE_SIZE}");
            let response =
                Self::send(self.request(Method::GET, &path, &Credential::Service)).await?;

            if !response.status().is_success() {
                let (status, body) = Self::failure(response).await;
                return Err(Self::rejected(status, &body));
            }

            let batch = Self::decode::<UserListBody>(response).await?.users;
            let last_page = batch.len() < LIST_PAGE_SIZE;
            identities.extend(batch.into_iter().map(Identity::from));

            if last_page {
                break;
            }
            page += 1;
        }

        tracing::debug!(count = identities.len(), "Listed identities");
        Ok(identities)
    }

    #[tracing::instrument(skip_all)]
    async fn verify_activation(&self, token: &str) -> GatewayResult<Session> {
        let response = Self::send(
            self.request(Method::POST, "verify", &Credential::Anonymous)
                .json(&json!({ "type": "invite", "token_hash": token })),
        )
        .await?;

        if response.status().is_success() {
            return Ok(Self::decode::<SessionBody>(response).await?.into());
        }

        let (status, body) = Self::failure(response).await;
        if status.is_client_error() {
            return Err(GatewayError::InvalidToken);
        }
        Err(Self::rejected(status, &body))
    }

    #[tracing::instrument(skip_all, fields(subject = %session.user_id))]
    async fn set_credential(&self, session: &Session, password: &str) -> GatewayResult<()> {
        let response = Self::send(
            self.request(
                Method::PUT,
                "user",
                &Credential::User(&session.access_token),
            )
            .json(&json!({ "password": password })),
        )
        .await?;

        if response.status().is_success() {
            return Ok(());
        }

        let (status, body) = Self::failure(response).await;
        match (status, body.error_code.as_deref()) {
            (_, Some("weak_password")) => Err(GatewayError::WeakPassword(body.message())),
            (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => {
                Err(GatewayError::InvalidToken)
            }
            _ => Err(Self::rejected(status, &body)),
        }
    }

    #[tracing::instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> GatewayResult<Session> {
        let response = Self::send(
            self.request(
                Method::POST,
                "token?grant_type=password",
                &Credential::Anonymous,
            )
            .json(&json!({ "email": email, "password": password })),
        )
        .await?;

        if response.status().is_success() {
            return Ok(Self::decode::<SessionBody>(response).await?.into());
        }

        let (status, body) = Self::failure(response).await;
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(GatewayError::InvalidCredentials);
        }
        Err(Self::rejected(status, &body))
    }
}
