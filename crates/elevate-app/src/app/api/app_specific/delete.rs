use salvo::prelude::Json;
use salvo::{Depot, Request, Router, handler};
use serde::{Deserialize, Serialize};

use elevate_service::deletion;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::get_token_from_depot;
use crate::services_handler::get_deps_from_depot;

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub target_id: uuid::Uuid,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// ## Summary
/// POST /api/app/delete - Delete an account at the identity provider and
/// in the profile store.
///
/// ## Errors
/// Returns HTTP 400 for a malformed body or self-deletion, 401 without a
/// valid token or if the actor may not delete the target, 404 if the target
/// does not exist, and 500 if the provider or the store fails.
#[handler]
async fn delete(req: &mut Request, depot: &mut Depot) -> AppResult<Json<DeleteResponse>> {
    let deps = get_deps_from_depot(depot)?;
    let request = req
        .parse_json::<DeleteRequest>()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    deletion::delete(&deps, get_token_from_depot(depot), request.target_id).await?;

    Ok(Json(DeleteResponse { success: true }))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("delete").post(delete)
}
