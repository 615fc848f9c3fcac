use salvo::async_trait;

use crate::error::AppResult;
use elevate_core::error::CoreError;
use elevate_service::ServiceDeps;

pub struct ServicesHandler {
    pub deps: ServiceDeps,
}

#[async_trait]
impl salvo::Handler for ServicesHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(self.deps.clone());
    }
}

/// ## Summary
/// Retrieves the service dependencies from the depot.
///
/// ## Errors
/// Returns an error if the dependencies are not found in the depot.
pub fn get_deps_from_depot(depot: &salvo::Depot) -> AppResult<ServiceDeps> {
    depot
        .obtain::<ServiceDeps>()
        .cloned()
        .map_err(|_err| CoreError::InvariantViolation("Service dependencies not found in depot").into())
}
