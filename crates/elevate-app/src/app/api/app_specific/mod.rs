// Account lifecycle endpoints, mounted under /api/app.

use salvo::Router;

use super::APP_ROUTE_COMPONENT;

mod activation;
mod delete;
mod healthcheck;
mod invite;
mod organizations;
mod reconcile;
mod users;
mod whoami;

#[must_use]
pub fn routes() -> Router {
    Router::with_path(APP_ROUTE_COMPONENT)
        .push(healthcheck::routes())
        .push(whoami::routes())
        .push(invite::routes())
        .push(delete::routes())
        .push(organizations::routes())
        .push(activation::routes())
        .push(users::routes())
        .push(reconcile::routes())
}
