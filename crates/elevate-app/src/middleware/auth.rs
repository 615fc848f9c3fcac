use salvo::Depot;
use salvo::http::header::AUTHORIZATION;

use elevate_core::constants::USER_TOKEN_HEADER;

pub mod depot_keys {
    pub const ACTOR_TOKEN: &str = "__actor_token";
}

/// ## Summary
/// Extracts the actor's bearer token and stores it in the depot.
///
/// The token is read from `Authorization: Bearer <token>`, falling back to
/// the `x-user-token` header. It is not validated here: every service call
/// authenticates the token itself, so a missing token simply reaches the
/// service as an empty string and is rejected there.
pub struct AuthMiddleware;

#[salvo::async_trait]
impl salvo::Handler for AuthMiddleware {
    #[tracing::instrument(skip(self, req, depot, _res, _ctrl), fields(
        method = %req.method(),
        path = %req.uri().path()
    ))]
    async fn handle(
        &self,
        req: &mut salvo::Request,
        depot: &mut Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        let token = bearer_token(req).unwrap_or_default();
        tracing::trace!(has_token = !token.is_empty(), "Actor token extracted");
        depot.insert(depot_keys::ACTOR_TOKEN, token);
    }
}

fn bearer_token(req: &salvo::Request) -> Option<String> {
    let from_authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            v.strip_prefix("Bearer ")
                .or_else(|| v.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|t| !t.is_empty());

    from_authorization
        .or_else(|| {
            req.headers()
                .get(USER_TOKEN_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|t| !t.is_empty())
        })
        .map(str::to_string)
}

/// Returns the actor token stored by [`AuthMiddleware`], empty if none.
#[must_use]
pub fn get_token_from_depot(depot: &Depot) -> &str {
    depot
        .get::<String>(depot_keys::ACTOR_TOKEN)
        .map_or("", String::as_str)
}
