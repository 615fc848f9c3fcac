use std::collections::HashSet;

use async_trait::async_trait;
use diesel::upsert::excluded;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;

use super::ProfileStore;
use crate::db::{DbProvider, connection::DbPool, schema};
use crate::error::DbResult;
use crate::model::{
    organization::{CreatorActiveOrg, NewCreatorActiveOrg, Organization},
    user::{NewUser, User, UserFilter},
};

/// `PostgreSQL` implementation of [`ProfileStore`] over the bb8 pool.
#[derive(Clone)]
pub struct PgProfileStore {
    pool: DbPool,
}

impl PgProfileStore {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    #[tracing::instrument(skip(self))]
    async fn find_user(&self, id: uuid::Uuid) -> DbResult<Option<User>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(schema::users::table
            .filter(schema::users::id.eq(id))
            .select(User::as_select())
            .first::<User>(&mut conn)
            .await
            .optional()?)
    }

    #[tracing::instrument(skip(self))]
    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(schema::users::table
            .filter(schema::users::email.eq(email))
            .select(User::as_select())
            .first::<User>(&mut conn)
            .await
            .optional()?)
    }

    #[tracing::instrument(skip(self, user), fields(user_id = %user.id, role = %user.role))]
    async fn insert_user(&self, user: &NewUser) -> DbResult<User> {
        let mut conn = self.pool.get_connection().await?;
        let row = diesel::insert_into(schema::users::table)
            .values(user)
            .returning(User::as_returning())
            .get_result::<User>(&mut conn)
            .await?;

        tracing::debug!("Profile row inserted");
        Ok(row)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_user(&self, id: uuid::Uuid) -> DbResult<bool> {
        let mut conn = self.pool.get_connection().await?;
        let removed = diesel::delete(schema::users::table.filter(schema::users::id.eq(id)))
            .execute(&mut conn)
            .await?;
        Ok(removed > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn list_users(&self, filter: &UserFilter) -> DbResult<Vec<User>> {
        let mut conn = self.pool.get_connection().await?;

        let mut query = schema::users::table
            .select(User::as_select())
            .order(schema::users::created_at.desc())
            .into_boxed();

        if let Some(role) = filter.role {
            query = query.filter(schema::users::role.eq(role));
        }
        if let Some(organization_id) = filter.organization_id {
            query = query.filter(schema::users::organization_id.eq(organization_id));
        }

        Ok(query.load::<User>(&mut conn).await?)
    }

    #[tracing::instrument(skip(self, ids), fields(count = ids.len()))]
    async fn existing_user_ids(&self, ids: &[uuid::Uuid]) -> DbResult<HashSet<uuid::Uuid>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let mut conn = self.pool.get_connection().await?;
        let found = schema::users::table
            .filter(schema::users::id.eq_any(ids))
            .select(schema::users::id)
            .load::<uuid::Uuid>(&mut conn)
            .await?;
        Ok(found.into_iter().collect())
    }

    #[tracing::instrument(skip(self))]
    async fn find_organization(&self, id: uuid::Uuid) -> DbResult<Option<Organization>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(schema::organizations::table
            .filter(schema::organizations::id.eq(id))
            .select(Organization::as_select())
            .first::<Organization>(&mut conn)
            .await
            .optional()?)
    }

    #[tracing::instrument(skip(self))]
    async fn list_organizations(&self) -> DbResult<Vec<Organization>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(schema::organizations::table
            .select(Organization::as_select())
            .order(schema::organizations::name.asc())
            .load::<Organization>(&mut conn)
            .await?)
    }

    #[tracing::instrument(skip(self))]
    async fn upsert_active_organization(
        &self,
        user_id: uuid::Uuid,
        organization_id: uuid::Uuid,
    ) -> DbResult<CreatorActiveOrg> {
        use schema::creator_active_org::dsl;

        let mut conn = self.pool.get_connection().await?;
        let cursor = NewCreatorActiveOrg {
            user_id,
            organization_id,
            updated_at: chrono::Utc::now(),
        };

        Ok(diesel::insert_into(dsl::creator_active_org)
            .values(&cursor)
            .on_conflict(dsl::user_id)
            .do_update()
            .set((
                dsl::organization_id.eq(excluded(dsl::organization_id)),
                dsl::updated_at.eq(excluded(dsl::updated_at)),
            ))
            .returning(CreatorActiveOrg::as_returning())
            .get_result::<CreatorActiveOrg>(&mut conn)
            .await?)
    }

    #[tracing::instrument(skip(self))]
    async fn active_organization(&self, user_id: uuid::Uuid) -> DbResult<Option<CreatorActiveOrg>> {
        let mut conn = self.pool.get_connection().await?;
        Ok(schema::creator_active_org::table
            .filter(schema::creator_active_org::user_id.eq(user_id))
            .select(CreatorActiveOrg::as_select())
            .first::<CreatorActiveOrg>(&mut conn)
            .await
            .optional()?)
    }
}
