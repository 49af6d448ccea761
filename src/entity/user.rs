use super::{Audit, ColumnInfo, Entity, AUDIT_COLUMNS};
use serde::Serialize;
use sqlx::FromRow;

const USER_COLUMNS: [ColumnInfo; 10] = [
    AUDIT_COLUMNS[0],
    AUDIT_COLUMNS[1],
    AUDIT_COLUMNS[2],
    AUDIT_COLUMNS[3],
    AUDIT_COLUMNS[4],
    AUDIT_COLUMNS[5],
    ColumnInfo::new("first_name", "text"),
    ColumnInfo::new("last_name", "text"),
    ColumnInfo::new("username", "text"),
    ColumnInfo::new("email", "text"),
];

/// Row of the `user` table. `username` and `email` are unique among active rows.
#[derive(Clone, Debug, PartialEq, Serialize, FromRow)]
pub struct UserEntity {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: Audit,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
}

impl Entity for UserEntity {
    const NAME: &'static str = "User";
    const TABLE: &'static str = "user";

    fn columns() -> &'static [ColumnInfo] {
        &USER_COLUMNS
    }

    fn audit(&self) -> &Audit {
        &self.audit
    }
}
