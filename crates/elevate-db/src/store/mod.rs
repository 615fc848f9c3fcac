//! Profile store adapter.
//!
//! Typed reads and writes against the `users`, `organizations` and
//! `creator_active_org` tables. No business rules live here: uniqueness is
//! reported as [`DbError::UniqueViolation`](crate::error::DbError) and left to
//! the caller to interpret.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::DbResult;
use crate::model::{
    organization::{CreatorActiveOrg, Organization},
    user::{NewUser, User, UserFilter},
};

pub mod pg;

pub use pg::PgProfileStore;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_user(&self, id: uuid::Uuid) -> DbResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<User>>;

    /// Inserts a profile. The store's own constraints are authoritative for
    /// `id` and `email` uniqueness.
    async fn insert_user(&self, user: &NewUser) -> DbResult<User>;

    /// Returns `true` if a row was removed.
    async fn delete_user(&self, id: uuid::Uuid) -> DbResult<bool>;

    /// Newest first.
    async fn list_users(&self, filter: &UserFilter) -> DbResult<Vec<User>>;

    /// Subset of `ids` that have a profile row.
    async fn existing_user_ids(&self, ids: &[uuid::Uuid]) -> DbResult<HashSet<uuid::Uuid>>;

    async fn find_organization(&self, id: uuid::Uuid) -> DbResult<Option<Organization>>;

    /// Ordered by name.
    async fn list_organizations(&self) -> DbResult<Vec<Organization>>;

    /// Insert-or-update in a single statement; the row is never absent once written.
    async fn upsert_active_organization(
        &self,
        user_id: uuid::Uuid,
        organization_id: uuid::Uuid,
    ) -> DbResult<CreatorActiveOrg>;

    async fn active_organization(&self, user_id: uuid::Uuid) -> DbResult<Option<CreatorActiveOrg>>;
}
