use super::Crud;
use crate::entity::UserEntity;
use crate::mappers::to_user_entity;
use crate::models::{UserCreate, UserUpdate};
use sqlx::PgConnection;

pub type UserDataService<'c> = Crud<'c, UserEntity, UserCreate, UserUpdate>;

impl<'c> UserDataService<'c> {
    pub fn users(conn: &'c mut PgConnection, schema: &'c str) -> Self {
        Crud::new(conn, schema, to_user_entity)
    }
}
