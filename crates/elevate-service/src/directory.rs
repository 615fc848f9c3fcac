//! Account listings for the portal views.

use elevate_db::model::user::{Role, User, UserFilter};

use crate::auth::authenticate;
use crate::context::ServiceDeps;
use crate::error::ServiceResult;
use crate::guard::store_call;
use crate::organization::resolve_scope;
use crate::policy::Action;

/// Listing a role is guarded by that role's view action. An unfiltered
/// listing includes admins, so it needs the admin-list grant.
const fn view_action(role: Option<Role>) -> Action {
    match role {
        Some(Role::Player) => Action::ViewPlayerList,
        Some(Role::Admin | Role::Creator) | None => Action::ViewAdminList,
    }
}

/// ## Summary
/// Lists profiles newest first, optionally filtered by role, limited to the
/// actor's organization scope.
///
/// ## Errors
/// - `Unauthenticated` if the token does not resolve to an actor
/// - `Unauthorized` if the actor may not view the requested list or scope
/// - `NotFound` if a creator names an unknown organization
/// - `Persistence` if the store fails
#[tracing::instrument(skip(deps, token))]
pub async fn list_users(
    deps: &ServiceDeps,
    token: &str,
    role: Option<Role>,
    requested_organization: Option<uuid::Uuid>,
) -> ServiceResult<Vec<User>> {
    let actor = authenticate(deps, token).await?;
    deps.policy.require(actor.role(), view_action(role), None)?;

    let scope = resolve_scope(deps, &actor, requested_organization).await?;
    let filter = UserFilter {
        role,
        organization_id: scope.organization_id(),
    };

    let users = store_call(deps.limits.store_timeout, deps.store.list_users(&filter)).await?;
    tracing::debug!(count = users.len(), "Listed users");
    Ok(users)
}

/// ## Summary
/// Returns the actor's own profile.
///
/// ## Errors
/// - `Unauthenticated` if the token does not resolve to an actor
#[tracing::instrument(skip_all)]
pub async fn whoami(deps: &ServiceDeps, token: &str) -> ServiceResult<User> {
    Ok(authenticate(deps, token).await?.user)
}
