use salvo::prelude::Json;
use salvo::{Depot, Request, Router, handler};
use serde::Serialize;

use elevate_db::model::user::Role;
use elevate_service::invitation::{self, InviteRequest};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::get_token_from_depot;
use crate::services_handler::get_deps_from_depot;

#[derive(Debug, Serialize)]
pub struct InviteResponse {
    pub success: bool,
    pub user_id: uuid::Uuid,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<uuid::Uuid>,
}

/// ## Summary
/// POST /api/app/invite - Invite a player or admin account.
///
/// ## Side Effects
/// - Creates a pending identity at the identity provider (activation email)
/// - Creates the profile row
///
/// ## Errors
/// Returns HTTP 400 on validation errors or a duplicate email,
/// 401 without a valid token or if the actor's role may not invite the
/// requested role, and 500 if the provider or the store fails.
#[handler]
async fn invite(req: &mut Request, depot: &mut Depot) -> AppResult<Json<InviteResponse>> {
    let deps = get_deps_from_depot(depot)?;
    let request = req
        .parse_json::<InviteRequest>()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let outcome = invitation::invite(&deps, get_token_from_depot(depot), request).await?;

    Ok(Json(InviteResponse {
        success: true,
        user_id: outcome.user_id,
        role: outcome.role,
        organization_id: outcome.organization_id,
    }))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("invite").post(invite)
}
