use diesel::{pg::Pg, prelude::*};
use serde::{Deserialize, Serialize};

use crate::db::schema;

// Re-export Role for public API
pub use crate::db::enums::Role;

/// Profile record keyed by the identity provider's subject id.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Identifiable, Queryable, Selectable, Serialize, Deserialize,
)]
#[diesel(table_name = schema::users)]
#[diesel(check_for_backend(Pg))]
pub struct User {
    pub id: uuid::Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub organization_id: Option<uuid::Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = schema::users)]
pub struct NewUser {
    pub id: uuid::Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub organization_id: Option<uuid::Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl NewUser {
    /// The row this insert would produce.
    #[must_use]
    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            organization_id: self.organization_id,
            created_at: self.created_at,
        }
    }

    /// Whether `existing` is the row written by an earlier attempt of this
    /// insert. Every column must agree, `created_at` included, so a row
    /// written by a different invitation for the same subject never matches.
    #[must_use]
    pub fn matches(&self, existing: &User) -> bool {
        *existing == self.to_user()
    }
}

/// Optional predicates for listing profiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub organization_id: Option<uuid::Uuid>,
}

impl UserFilter {
    #[must_use]
    pub fn accepts(&self, user: &User) -> bool {
        self.role.is_none_or(|role| user.role == role)
            && self
                .organization_id
                .is_none_or(|org| user.organization_id == Some(org))
    }
}
