use salvo::prelude::Json;
use salvo::{Depot, Router, handler};

use elevate_db::model::user::User;
use elevate_service::directory;

use crate::error::AppResult;
use crate::middleware::auth::get_token_from_depot;
use crate::services_handler::get_deps_from_depot;

/// ## Summary
/// Returns the authenticated actor's profile as JSON.
#[handler]
async fn whoami(depot: &mut Depot) -> AppResult<Json<User>> {
    let deps = get_deps_from_depot(depot)?;
    let user = directory::whoami(&deps, get_token_from_depot(depot)).await?;
    Ok(Json(user))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("whoami").get(whoami)
}
