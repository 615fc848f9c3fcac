//! Role policy engine.
//!
//! Maps `(actor role, action, target role)` to allow or deny. The rule table
//! is compiled into the binary and loaded into an in-memory casbin enforcer,
//! so evaluation performs no I/O and is deterministic. Every service entry
//! point calls [`PolicyEngine::require`] before touching an external system.

use std::sync::Arc;

use casbin::{CoreApi, MgmtApi};
use string_adapter::StringAdapter;

use elevate_db::model::user::Role;

use crate::error::{ServiceError, ServiceResult};

/// Placeholder object for actions that do not target a role.
const NO_TARGET: &str = "-";

/// Actions guarded by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Invite,
    Delete,
    SwitchOrganization,
    ViewAdminList,
    ViewPlayerList,
    ViewOrganizations,
    Reconcile,
}

impl Action {
    #[must_use]
    pub const fn as_casbin_action(self) -> &'static str {
        match self {
            Self::Invite => "invite",
            Self::Delete => "delete",
            Self::SwitchOrganization => "switch_organization",
            Self::ViewAdminList => "view_admin_list",
            Self::ViewPlayerList => "view_player_list",
            Self::ViewOrganizations => "view_organizations",
            Self::Reconcile => "reconcile",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_casbin_action())
    }
}

/// Result of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied,
}

impl Decision {
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

pub struct PolicyEngine {
    enforcer: casbin::Enforcer,
}

impl PolicyEngine {
    /// ## Summary
    /// Builds the engine from the embedded model and rule table.
    ///
    /// ## Errors
    /// Returns `CasbinError` if the model or the rule table fails to load.
    #[tracing::instrument]
    pub async fn new() -> ServiceResult<Arc<Self>> {
        let model = casbin::DefaultModel::from_str(include_str!("model.conf")).await?;
        let adapter = StringAdapter::new(include_str!("policy.csv"));
        let enforcer = casbin::Enforcer::new(model, adapter).await?;

        tracing::info!(
            policy_count = enforcer.get_policy().len(),
            "Role policy loaded"
        );

        Ok(Arc::new(Self { enforcer }))
    }

    /// Evaluates the rule table. Combinations that are not listed are denied,
    /// and an evaluation failure also denies.
    #[must_use]
    pub fn evaluate(&self, actor: Role, action: Action, target: Option<Role>) -> Decision {
        let target = target.map_or(NO_TARGET, Role::as_str);

        match self
            .enforcer
            .enforce((actor.as_str(), action.as_casbin_action(), target))
        {
            Ok(true) => Decision::Allowed,
            Ok(false) => Decision::Denied,
            Err(e) => {
                tracing::error!(error = %e, %actor, %action, target_role = target, "Policy evaluation failed; denying");
                Decision::Denied
            }
        }
    }

    /// ## Summary
    /// Like [`evaluate`](Self::evaluate), but a denial becomes an error.
    ///
    /// ## Errors
    /// Returns `Unauthorized` when the policy denies the action.
    pub fn require(&self, actor: Role, action: Action, target: Option<Role>) -> ServiceResult<()> {
        if self.evaluate(actor, action, target).is_allowed() {
            return Ok(());
        }

        tracing::warn!(%actor, %action, target = ?target, "Policy denied action");
        Err(ServiceError::Unauthorized(match target {
            Some(target) => format!("Role '{actor}' may not {action} '{target}' accounts"),
            None => format!("Role '{actor}' may not {action}"),
        }))
    }
}
