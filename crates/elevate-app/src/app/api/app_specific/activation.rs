use salvo::prelude::Json;
use salvo::{Depot, Request, Router, handler};
use serde::Serialize;

use elevate_service::activation::{self, ActivationRequest};
use elevate_service::identity::Session;

use crate::error::{AppError, AppResult};
use crate::services_handler::get_deps_from_depot;

#[derive(Debug, Serialize)]
pub struct ActivationResponse {
    pub success: bool,
    pub session: Session,
}

/// ## Summary
/// POST /api/app/completeActivation - Set the first password of an invited
/// account. Needs no bearer token; the activation token authenticates.
///
/// ## Errors
/// Returns HTTP 400 for an invalid, expired or used token or a weak
/// password, and 500 if the identity provider fails.
#[handler]
async fn complete_activation(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Json<ActivationResponse>> {
    let deps = get_deps_from_depot(depot)?;
    let request = req
        .parse_json::<ActivationRequest>()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let session = activation::complete_activation(&deps, request).await?;

    Ok(Json(ActivationResponse {
        success: true,
        session,
    }))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("completeActivation").post(complete_activation)
}
