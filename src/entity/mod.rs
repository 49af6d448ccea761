//! Persisted entities and the column metadata the SQL builder works from.

mod user;

pub use user::UserEntity;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::FromRow;
use uuid::Uuid;

pub const ID_COLUMN: &str = "id";
pub const ACTIVE_COLUMN: &str = "is_active";
pub const LAST_MODIFIED_DATE_COLUMN: &str = "last_modified_date";
pub const LAST_MODIFIED_BY_COLUMN: &str = "last_modified_by_user_id";

/// One mapped column. `pg_type` is used for parameter casts (`$1::uuid`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: &'static str,
    pub pg_type: &'static str,
    /// False for columns written once at insert (id, created_*).
    pub updatable: bool,
}

impl ColumnInfo {
    pub const fn new(name: &'static str, pg_type: &'static str) -> Self {
        ColumnInfo {
            name,
            pg_type,
            updatable: true,
        }
    }

    pub const fn immutable(name: &'static str, pg_type: &'static str) -> Self {
        ColumnInfo {
            name,
            pg_type,
            updatable: false,
        }
    }
}

/// Audit columns carried by every entity, in table order.
pub const AUDIT_COLUMNS: [ColumnInfo; 6] = [
    ColumnInfo::immutable(ID_COLUMN, "uuid"),
    ColumnInfo::immutable("created_date", "timestamptz"),
    ColumnInfo::new(LAST_MODIFIED_DATE_COLUMN, "timestamptz"),
    ColumnInfo::immutable("created_by_user_id", "text"),
    ColumnInfo::new(LAST_MODIFIED_BY_COLUMN, "text"),
    ColumnInfo::new(ACTIVE_COLUMN, "boolean"),
];

/// Audit metadata flattened into every entity row.
///
/// `created_*` is written once at insert; `last_modified_*` on every mutation.
/// Rows are soft-deleted by clearing `is_active`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Audit {
    pub id: Uuid,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
    pub created_by_user_id: String,
    pub last_modified_by_user_id: String,
    pub is_active: bool,
}

impl Audit {
    /// Fresh audit block for a new row: new v4 id, both timestamps equal.
    pub fn new(actor_id: &str, is_active: bool) -> Self {
        let now = Utc::now();
        Audit {
            id: Uuid::new_v4(),
            created_date: now,
            last_modified_date: now,
            created_by_user_id: actor_id.to_string(),
            last_modified_by_user_id: actor_id.to_string(),
            is_active,
        }
    }
}

/// A table-backed record the generic CRUD layer can persist.
///
/// Serialization must produce one key per column (audit fields flattened);
/// the insert statement is built from it.
pub trait Entity: for<'r> FromRow<'r, PgRow> + Serialize + Send + Sync + Unpin + 'static {
    /// Name used in log and error messages.
    const NAME: &'static str;
    /// Unqualified table name; the schema comes from configuration.
    const TABLE: &'static str;

    fn columns() -> &'static [ColumnInfo];

    fn audit(&self) -> &Audit;

    fn id(&self) -> Uuid {
        self.audit().id
    }

    fn column(name: &str) -> Option<&'static ColumnInfo> {
        Self::columns().iter().find(|c| c.name == name)
    }
}
