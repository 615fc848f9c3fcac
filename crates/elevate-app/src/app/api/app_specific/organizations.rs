use salvo::prelude::Json;
use salvo::{Depot, Request, Router, handler};
use serde::{Deserialize, Serialize};

use elevate_db::model::organization::Organization;
use elevate_service::organization;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::get_token_from_depot;
use crate::services_handler::get_deps_from_depot;

#[derive(Debug, Deserialize)]
pub struct SwitchRequest {
    pub organization_id: uuid::Uuid,
}

#[derive(Debug, Serialize)]
pub struct SwitchResponse {
    pub success: bool,
    pub organization_id: uuid::Uuid,
}

#[derive(Debug, Serialize)]
pub struct OrganizationsResponse {
    pub organizations: Vec<Organization>,
}

#[derive(Debug, Serialize)]
pub struct ActiveOrganizationResponse {
    pub organization_id: Option<uuid::Uuid>,
}

/// ## Summary
/// POST /api/app/switchOrganization - Set the creator's active organization.
///
/// ## Errors
/// Returns HTTP 401 without a valid token or for non-creators, 404 for an
/// unknown organization.
#[handler]
async fn switch_organization(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Json<SwitchResponse>> {
    let deps = get_deps_from_depot(depot)?;
    let request = req
        .parse_json::<SwitchRequest>()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let active =
        organization::switch_organization(&deps, get_token_from_depot(depot), request.organization_id)
            .await?;

    Ok(Json(SwitchResponse {
        success: true,
        organization_id: active.organization_id,
    }))
}

/// ## Summary
/// GET /api/app/organizations - Organizations a creator can switch to.
#[handler]
async fn list_organizations(depot: &mut Depot) -> AppResult<Json<OrganizationsResponse>> {
    let deps = get_deps_from_depot(depot)?;
    let organizations =
        organization::list_organizations(&deps, get_token_from_depot(depot)).await?;
    Ok(Json(OrganizationsResponse { organizations }))
}

/// ## Summary
/// GET /api/app/organizations/active - The creator's active organization.
#[handler]
async fn active_organization(depot: &mut Depot) -> AppResult<Json<ActiveOrganizationResponse>> {
    let deps = get_deps_from_depot(depot)?;
    let active = organization::active_organization(&deps, get_token_from_depot(depot)).await?;
    Ok(Json(ActiveOrganizationResponse {
        organization_id: active.map(|a| a.organization_id),
    }))
}

#[must_use]
pub fn routes() -> Router {
    Router::new()
        .push(Router::with_path("switchOrganization").post(switch_organization))
        .push(
            Router::with_path("organizations")
                .get(list_organizations)
                .push(Router::with_path("active").get(active_organization)),
        )
}
