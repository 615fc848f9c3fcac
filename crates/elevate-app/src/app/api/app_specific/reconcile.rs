use salvo::prelude::Json;
use salvo::{Depot, Router, handler};

use elevate_service::reconcile::{self as reconcile_service, ReconcileReport};

use crate::error::AppResult;
use crate::middleware::auth::get_token_from_depot;
use crate::services_handler::get_deps_from_depot;

/// ## Summary
/// POST /api/app/reconcile - Run the orphaned-invitation sweep now.
/// Creator only.
#[handler]
async fn reconcile(depot: &mut Depot) -> AppResult<Json<ReconcileReport>> {
    let deps = get_deps_from_depot(depot)?;
    let report = reconcile_service::reconcile_now(&deps, get_token_from_depot(depot)).await?;
    Ok(Json(report))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("reconcile").post(reconcile)
}
