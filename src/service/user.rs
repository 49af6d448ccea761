use super::base::{BaseService, Resource};
use crate::data::{DataService, Filter, UserDataService};
use crate::entity::{UserEntity, ACTIVE_COLUMN};
use crate::models::{Page, PageRequest, ServiceResult, User, UserCreate, UserUpdate};
use sqlx::PgConnection;

pub struct UserResource;

impl Resource for UserResource {
    type Entity = UserEntity;
    type Model = User;
    type Create = UserCreate;
    type Update = UserUpdate;

    const MODEL_NAME: &'static str = "User";
    const CREATE_UNIQUE_VALIDATION_MSG: &'static str = "{model_class} with given username or email already exists";
    const UPDATE_UNIQUE_VALIDATION_MSG: &'static str = "{model_class} with given username or email already exists";
}

pub type UserService<D> = BaseService<UserResource, D>;

impl<'c> UserService<UserDataService<'c>> {
    /// Service bound to one request's connection.
    pub fn for_connection(conn: &'c mut PgConnection, schema: &'c str) -> Self {
        BaseService::new(UserDataService::users(conn, schema))
    }
}

impl<D> UserService<D>
where
    D: DataService<Entity = UserEntity, Create = UserCreate, Update = UserUpdate>,
{
    /// `get_page` with an optional `is_active` filter. Without it only active users are listed.
    pub async fn list_users(&mut self, mut page: PageRequest, is_active: Option<bool>) -> ServiceResult<Page<User>> {
        if let Some(active) = is_active {
            page.filters.push(Filter::equals(ACTIVE_COLUMN, active));
        }
        self.get_page(&page).await
    }
}
