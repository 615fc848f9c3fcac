//! In-memory profile store.
//!
//! Enforces the same uniqueness and foreign-key rules as the `PostgreSQL`
//! schema: checks and writes happen under one lock, so concurrent inserts
//! with the same email cannot both succeed.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use elevate_db::error::{DbError, DbResult, UniqueField};
use elevate_db::model::organization::{CreatorActiveOrg, Organization};
use elevate_db::model::user::{NewUser, Role, User, UserFilter};
use elevate_db::store::ProfileStore;

#[derive(Default)]
struct StoreState {
    users: HashMap<uuid::Uuid, User>,
    organizations: HashMap<uuid::Uuid, Organization>,
    cursors: HashMap<uuid::Uuid, CreatorActiveOrg>,
}

#[derive(Default)]
pub struct MemoryProfileStore {
    state: Mutex<StoreState>,
    failing_inserts: AtomicU32,
    lost_insert_acks: AtomicU32,
    failing_deletes: AtomicU32,
}

/// Consumes one pending injected failure, if any.
fn take_failure(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

impl MemoryProfileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The next `n` inserts fail as if the store were unreachable.
    pub fn fail_next_inserts(&self, n: u32) {
        self.failing_inserts.store(n, Ordering::SeqCst);
    }

    /// The next `n` inserts are written but report the store as unreachable,
    /// as when the connection drops before the commit is acknowledged.
    pub fn lose_next_insert_acks(&self, n: u32) {
        self.lost_insert_acks.store(n, Ordering::SeqCst);
    }

    /// The next `n` deletes fail as if the store were unreachable.
    pub fn fail_next_deletes(&self, n: u32) {
        self.failing_deletes.store(n, Ordering::SeqCst);
    }

    #[must_use]
    pub fn add_organization(&self, name: &str) -> Organization {
        let organization = Organization {
            id: uuid::Uuid::new_v4(),
            name: name.to_string(),
        };
        self.state()
            .organizations
            .insert(organization.id, organization.clone());
        organization
    }

    /// Writes a profile directly, bypassing the services.
    pub fn put_user(&self, user: User) {
        self.state().users.insert(user.id, user);
    }

    #[must_use]
    pub fn user(&self, id: uuid::Uuid) -> Option<User> {
        self.state().users.get(&id).cloned()
    }

    #[must_use]
    pub fn users_with_email(&self, email: &str) -> Vec<User> {
        self.state()
            .users
            .values()
            .filter(|u| u.email == email)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        self.state().users.len()
    }

    #[must_use]
    pub fn cursor(&self, user_id: uuid::Uuid) -> Option<CreatorActiveOrg> {
        self.state().cursors.get(&user_id).cloned()
    }

    #[must_use]
    pub fn count_role(&self, role: Role) -> usize {
        self.state().users.values().filter(|u| u.role == role).count()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn find_user(&self, id: uuid::Uuid) -> DbResult<Option<User>> {
        Ok(self.state().users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        Ok(self
            .state()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert_user(&self, user: &NewUser) -> DbResult<User> {
        if take_failure(&self.failing_inserts) {
            return Err(DbError::Unavailable("injected insert failure".to_string()));
        }

        let mut state = self.state();
        if state.users.contains_key(&user.id) {
            return Err(DbError::UniqueViolation(UniqueField::Id));
        }
        if state.users.values().any(|u| u.email == user.email) {
            return Err(DbError::UniqueViolation(UniqueField::Email));
        }
        if let Some(org) = user.organization_id
            && !state.organizations.contains_key(&org)
        {
            return Err(DbError::ForeignKeyViolation("users_organization_id_fkey".to_string()));
        }

        let row = user.to_user();
        state.users.insert(row.id, row.clone());
        if take_failure(&self.lost_insert_acks) {
            return Err(DbError::Unavailable("injected lost acknowledgement".to_string()));
        }
        Ok(row)
    }

    async fn delete_user(&self, id: uuid::Uuid) -> DbResult<bool> {
        if take_failure(&self.failing_deletes) {
            return Err(DbError::Unavailable("injected delete failure".to_string()));
        }

        let mut state = self.state();
        state.cursors.remove(&id);
        Ok(state.users.remove(&id).is_some())
    }

    async fn list_users(&self, filter: &UserFilter) -> DbResult<Vec<User>> {
        let mut users: Vec<User> = self
            .state()
            .users
            .values()
            .filter(|u| filter.accepts(u))
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn existing_user_ids(&self, ids: &[uuid::Uuid]) -> DbResult<HashSet<uuid::Uuid>> {
        let state = self.state();
        Ok(ids
            .iter()
            .filter(|id| state.users.contains_key(id))
            .copied()
            .collect())
    }

    async fn find_organization(&self, id: uuid::Uuid) -> DbResult<Option<Organization>> {
        Ok(self.state().organizations.get(&id).cloned())
    }

    async fn list_organizations(&self) -> DbResult<Vec<Organization>> {
        let mut organizations: Vec<Organization> =
            self.state().organizations.values().cloned().collect();
        organizations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(organizations)
    }

    async fn upsert_active_organization(
        &self,
        user_id: uuid::Uuid,
        organization_id: uuid::Uuid,
    ) -> DbResult<CreatorActiveOrg> {
        let mut state = self.state();
        if !state.users.contains_key(&user_id) {
            return Err(DbError::ForeignKeyViolation("creator_active_org_user_id_fkey".to_string()));
        }
        if !state.organizations.contains_key(&organization_id) {
            return Err(DbError::ForeignKeyViolation(
                "creator_active_org_organization_id_fkey".to_string(),
            ));
        }

        let cursor = CreatorActiveOrg {
            user_id,
            organization_id,
            updated_at: chrono::Utc::now(),
        };
        state.cursors.insert(user_id, cursor.clone());
        Ok(cursor)
    }

    async fn active_organization(&self, user_id: uuid::Uuid) -> DbResult<Option<CreatorActiveOrg>> {
        Ok(self.state().cursors.get(&user_id).cloned())
    }
}
