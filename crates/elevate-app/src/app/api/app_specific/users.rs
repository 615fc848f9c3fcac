use std::str::FromStr;

use salvo::prelude::Json;
use salvo::{Depot, Request, Router, handler};
use serde::Serialize;

use elevate_core::constants::ORGANIZATION_HEADER;
use elevate_db::model::user::{Role, User};
use elevate_service::directory;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::get_token_from_depot;
use crate::services_handler::get_deps_from_depot;

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

fn role_param(req: &Request) -> AppResult<Option<Role>> {
    req.query::<String>("role")
        .filter(|r| !r.is_empty())
        .map(|r| Role::from_str(&r).map_err(AppError::BadRequest))
        .transpose()
}

fn organization_param(req: &Request) -> AppResult<Option<uuid::Uuid>> {
    req.headers()
        .get(ORGANIZATION_HEADER)
        .map(|value| {
            value
                .to_str()
                .ok()
                .and_then(|v| uuid::Uuid::parse_str(v.trim()).ok())
                .ok_or_else(|| {
                    AppError::BadRequest(format!("{ORGANIZATION_HEADER} must be a UUID"))
                })
        })
        .transpose()
}

/// ## Summary
/// GET /api/app/users?role=player|admin - Accounts visible to the actor,
/// newest first. Creators may pass `x-organization-id` to pick a tenant;
/// otherwise their active organization applies.
///
/// ## Errors
/// Returns HTTP 400 for a bad role or organization header, 401 without a
/// valid token or if the actor may not view the list.
#[handler]
async fn list_users(req: &mut Request, depot: &mut Depot) -> AppResult<Json<UsersResponse>> {
    let deps = get_deps_from_depot(depot)?;
    let role = role_param(req)?;
    let organization = organization_param(req)?;

    let users =
        directory::list_users(&deps, get_token_from_depot(depot), role, organization).await?;

    Ok(Json(UsersResponse { users }))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("users").get(list_users)
}
