use elevate_db::model::user::{Role, User};

/// The caller of a service operation, resolved from its bearer token.
///
/// The role always comes from the actor's own profile row, never from the
/// request or from provider metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user: User,
}

impl Actor {
    #[must_use]
    pub const fn id(&self) -> uuid::Uuid {
        self.user.id
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.user.role
    }

    /// The tenant the account was invited into, if any.
    #[must_use]
    pub const fn organization_id(&self) -> Option<uuid::Uuid> {
        self.user.organization_id
    }
}
