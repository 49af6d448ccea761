//! Create-model → entity mappers, passed to the CRUD layer as function values.

mod user;

pub use user::to_user_entity;

/// Builds a new, unsaved entity from a create model and the acting user id.
pub type Mapper<E, C> = fn(C, &str) -> E;
