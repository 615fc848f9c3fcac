//! Elevate account service - integration test support.
//!
//! Provides in-memory doubles for the profile store and the identity
//! provider, and a [`TestHarness`] that wires them into the real services
//! and HTTP router.

use std::sync::Arc;
use std::time::Duration;

use salvo::{Router, Service};

use elevate_app::app::api::routes;
use elevate_app::middleware::cors::cors_handler;
use elevate_app::services_handler::ServicesHandler;
use elevate_core::config::ServerConfig;
use elevate_db::model::organization::Organization;
use elevate_db::model::user::{Role, User};
use elevate_service::policy::PolicyEngine;
use elevate_service::{Limits, ServiceDeps};

pub mod identity;
pub mod store;

pub use identity::{GatewayOp, MemoryIdentityGateway};
pub use store::MemoryProfileStore;

/// Password given to seeded accounts.
pub const SEED_PASSWORD: &str = "correct-horse";

/// An account that exists in both systems, with a live bearer token.
#[derive(Debug, Clone)]
pub struct SeededAccount {
    pub user: User,
    pub token: String,
}

pub struct TestHarness {
    pub store: Arc<MemoryProfileStore>,
    pub identity: Arc<MemoryIdentityGateway>,
    pub deps: ServiceDeps,
}

impl TestHarness {
    /// ## Panics
    /// Panics if the embedded policy fails to load.
    #[expect(clippy::expect_used, reason = "Policy load failure is fatal in tests")]
    pub async fn new() -> Self {
        let store = Arc::new(MemoryProfileStore::new());
        let identity = Arc::new(MemoryIdentityGateway::new());
        let policy = PolicyEngine::new().await.expect("embedded policy loads");

        let limits = Limits {
            store_timeout: Duration::from_secs(2),
            identity_timeout: Duration::from_secs(2),
            write_attempts: 3,
            retry_base_delay: Duration::from_millis(1),
            min_password_length: 6,
            reconcile_min_age: chrono::Duration::minutes(2),
        };

        let deps = ServiceDeps::new(store.clone(), identity.clone(), policy, limits);

        Self {
            store,
            identity,
            deps,
        }
    }

    #[must_use]
    pub fn organization(&self, name: &str) -> Organization {
        self.store.add_organization(name)
    }

    /// Creates an account in both systems and signs it in.
    #[must_use]
    pub fn seed_account(
        &self,
        name: &str,
        email: &str,
        role: Role,
        organization_id: Option<uuid::Uuid>,
    ) -> SeededAccount {
        let id = self
            .identity
            .create_identity(email, Some(SEED_PASSWORD), None);
        let user = User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            role,
            organization_id,
            created_at: chrono::Utc::now(),
        };
        self.store.put_user(user.clone());
        let token = self.identity.issue_token(id);

        SeededAccount { user, token }
    }

    #[must_use]
    pub fn creator(&self) -> SeededAccount {
        self.seed_account("Creator", "creator@example.com", Role::Creator, None)
    }

    #[must_use]
    pub fn admin(&self, organization_id: Option<uuid::Uuid>) -> SeededAccount {
        self.seed_account("Admin", "admin@example.com", Role::Admin, organization_id)
    }

    #[must_use]
    pub fn player(&self, organization_id: Option<uuid::Uuid>) -> SeededAccount {
        self.seed_account("Player", "player@example.com", Role::Player, organization_id)
    }

    /// The HTTP service as `main` assembles it, over the in-memory doubles.
    #[must_use]
    pub fn service(&self) -> Service {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5800,
            serve_origin: None,
            allowed_origins: Vec::new(),
        };

        let router = Router::new()
            .hoop(ServicesHandler {
                deps: self.deps.clone(),
            })
            .push(routes());
        Service::new(router).hoop(cors_handler(&server))
    }
}
