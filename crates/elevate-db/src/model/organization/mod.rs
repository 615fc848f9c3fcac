use diesel::{pg::Pg, prelude::*};
use serde::{Deserialize, Serialize};

use crate::db::schema;

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Identifiable, Queryable, Selectable, Serialize, Deserialize,
)]
#[diesel(table_name = schema::organizations)]
#[diesel(check_for_backend(Pg))]
pub struct Organization {
    pub id: uuid::Uuid,
    pub name: String,
}

/// The tenant a creator is currently viewing.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Identifiable, Queryable, Selectable, Serialize, Deserialize,
)]
#[diesel(table_name = schema::creator_active_org)]
#[diesel(check_for_backend(Pg))]
#[diesel(primary_key(user_id))]
pub struct CreatorActiveOrg {
    pub user_id: uuid::Uuid,
    pub organization_id: uuid::Uuid,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = schema::creator_active_org)]
pub struct NewCreatorActiveOrg {
    pub user_id: uuid::Uuid,
    pub organization_id: uuid::Uuid,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
