//! Organization switch service and tenant scoping.
//!
//! A creator's active organization is stored as a cursor row and read back
//! into an explicit [`OrganizationScope`] that callers pass to every
//! organization-scoped query. Nothing here holds process-wide state.

use serde::Serialize;

use elevate_db::model::organization::Organization;
use elevate_db::model::user::Role;

use crate::auth::{Actor, authenticate};
use crate::context::ServiceDeps;
use crate::error::{ServiceError, ServiceResult};
use crate::guard::store_call;
use crate::policy::Action;

/// Tenant filter applied to an organization-scoped query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum OrganizationScope {
    /// No tenant filter.
    #[default]
    Unscoped,
    Organization(uuid::Uuid),
}

impl OrganizationScope {
    #[must_use]
    pub const fn organization_id(self) -> Option<uuid::Uuid> {
        match self {
            Self::Unscoped => None,
            Self::Organization(id) => Some(id),
        }
    }
}

/// Result of a successful switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveOrganization {
    pub organization_id: uuid::Uuid,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// ## Summary
/// Points the creator's active-organization cursor at `organization_id`.
/// Repeating a switch to the same organization succeeds again.
///
/// ## Side Effects
/// - Upserts the actor's `creator_active_org` row
///
/// ## Errors
/// - `Unauthenticated` if the token does not resolve to an actor
/// - `Unauthorized` if the actor is not a creator
/// - `NotFound` if the organization does not exist
/// - `Persistence` if the store fails
#[tracing::instrument(skip(deps, token), fields(organization_id = %organization_id))]
pub async fn switch_organization(
    deps: &ServiceDeps,
    token: &str,
    organization_id: uuid::Uuid,
) -> ServiceResult<ActiveOrganization> {
    let actor = authenticate(deps, token).await?;
    deps.policy
        .require(actor.role(), Action::SwitchOrganization, None)?;

    let limit = deps.limits.store_timeout;
    if store_call(limit, deps.store.find_organization(organization_id))
        .await?
        .is_none()
    {
        return Err(ServiceError::NotFound(format!(
            "Organization {organization_id} does not exist"
        )));
    }

    let cursor = store_call(
        limit,
        deps.store
            .upsert_active_organization(actor.id(), organization_id),
    )
    .await?;

    tracing::info!(user_id = %actor.id(), organization_id = %organization_id, "Active organization switched");

    Ok(ActiveOrganization {
        organization_id: cursor.organization_id,
        updated_at: cursor.updated_at,
    })
}

/// ## Summary
/// Reads the creator's active organization, `None` if never switched.
///
/// ## Errors
/// - `Unauthenticated`, `Unauthorized` (non-creator), `Persistence`
#[tracing::instrument(skip_all)]
pub async fn active_organization(
    deps: &ServiceDeps,
    token: &str,
) -> ServiceResult<Option<ActiveOrganization>> {
    let actor = authenticate(deps, token).await?;
    deps.policy
        .require(actor.role(), Action::SwitchOrganization, None)?;

    let cursor = store_call(
        deps.limits.store_timeout,
        deps.store.active_organization(actor.id()),
    )
    .await?;

    Ok(cursor.map(|c| ActiveOrganization {
        organization_id: c.organization_id,
        updated_at: c.updated_at,
    }))
}

/// ## Summary
/// Lists every organization a creator may switch to, ordered by name.
///
/// ## Errors
/// - `Unauthenticated`, `Unauthorized` (non-creator), `Persistence`
#[tracing::instrument(skip_all)]
pub async fn list_organizations(
    deps: &ServiceDeps,
    token: &str,
) -> ServiceResult<Vec<Organization>> {
    let actor = authenticate(deps, token).await?;
    deps.policy
        .require(actor.role(), Action::ViewOrganizations, None)?;

    Ok(store_call(deps.limits.store_timeout, deps.store.list_organizations()).await?)
}

/// ## Summary
/// Determines the tenant scope for an organization-scoped operation.
///
/// - Creator: `requested`, else the active-organization cursor, else unscoped.
/// - Admin: always the admin's own organization; requesting another is denied.
/// - Player: the player's own organization.
///
/// ## Errors
/// - `Unauthorized` if an admin or player requests a foreign organization
/// - `NotFound` if a creator requests an organization that does not exist
/// - `Persistence` if the store fails
pub async fn resolve_scope(
    deps: &ServiceDeps,
    actor: &Actor,
    requested: Option<uuid::Uuid>,
) -> ServiceResult<OrganizationScope> {
    let limit = deps.limits.store_timeout;

    match actor.role() {
        Role::Creator => {
            if let Some(id) = requested {
                if store_call(limit, deps.store.find_organization(id))
                    .await?
                    .is_none()
                {
                    return Err(ServiceError::NotFound(format!(
                        "Organization {id} does not exist"
                    )));
                }
                return Ok(OrganizationScope::Organization(id));
            }

            let cursor = store_call(limit, deps.store.active_organization(actor.id())).await?;
            Ok(cursor.map_or(OrganizationScope::Unscoped, |c| {
                OrganizationScope::Organization(c.organization_id)
            }))
        }
        Role::Admin | Role::Player => {
            let own = actor.organization_id();
            if let Some(id) = requested
                && own != Some(id)
            {
                tracing::warn!(user_id = %actor.id(), requested = %id, "Cross-organization access denied");
                return Err(ServiceError::Unauthorized(
                    "Only creators may act on other organizations".to_string(),
                ));
            }
            Ok(own.map_or(OrganizationScope::Unscoped, OrganizationScope::Organization))
        }
    }
}
