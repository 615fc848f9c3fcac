//! Collaborators and limits shared by every service entry point.

use std::sync::Arc;
use std::time::Duration;

use elevate_core::config::Settings;
use elevate_db::store::ProfileStore;

use crate::identity::IdentityGateway;
use crate::policy::PolicyEngine;

/// Timeouts and retry budgets applied to external calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub store_timeout: Duration,
    pub identity_timeout: Duration,
    /// Total attempts for a profile write, including the first.
    pub write_attempts: u32,
    pub retry_base_delay: Duration,
    pub min_password_length: usize,
    /// Identities younger than this are left alone by the reconciliation sweep.
    pub reconcile_min_age: chrono::Duration,
}

impl Limits {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            store_timeout: settings.database.timeout(),
            identity_timeout: settings.identity.timeout(),
            write_attempts: settings.invitation.write_attempts.max(1),
            retry_base_delay: settings.invitation.retry_base_delay(),
            min_password_length: settings.activation.min_password_length,
            reconcile_min_age: chrono::Duration::seconds(settings.reconciliation.min_age_secs),
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(5),
            identity_timeout: Duration::from_secs(10),
            write_attempts: 4,
            retry_base_delay: Duration::from_millis(200),
            min_password_length: 6,
            reconcile_min_age: chrono::Duration::minutes(2),
        }
    }
}

/// Everything a service call needs. Cheap to clone.
#[derive(Clone)]
pub struct ServiceDeps {
    pub store: Arc<dyn ProfileStore>,
    pub identity: Arc<dyn IdentityGateway>,
    pub policy: Arc<PolicyEngine>,
    pub limits: Limits,
}

impl ServiceDeps {
    #[must_use]
    pub fn new(
        store: Arc<dyn ProfileStore>,
        identity: Arc<dyn IdentityGateway>,
        policy: Arc<PolicyEngine>,
        limits: Limits,
    ) -> Self {
        Self {
            store,
            identity,
            policy,
            limits,
        }
    }
}
