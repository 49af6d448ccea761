use crate::entity::{Audit, UserEntity};
use crate::models::UserCreate;

pub fn to_user_entity(model: UserCreate, actor_id: &str) -> UserEntity {
    UserEntity {
        audit: Audit::new(actor_id, model.is_active),
        first_name: model.first_name,
        last_name: model.last_name,
        username: model.username,
        email: model.email,
    }
}
