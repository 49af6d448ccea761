//! Generic service: orchestrates a [`DataService`] and turns data-layer
//! failures into [`ErrorResult`]s.

use crate::data::DataService;
use crate::entity::Entity;
use crate::error::CrudError;
use crate::models::{ErrorResult, Page, PageRequest, ServiceResult};
use std::marker::PhantomData;
use uuid::Uuid;

const GET_BY_ID_NOT_FOUND_MSG: &str = "{model_class} with id {id} not found";

/// Per-entity configuration of a [`BaseService`].
///
/// Message templates may contain `{model_class}`, replaced by [`Resource::MODEL_NAME`].
pub trait Resource: Send + 'static {
    type Entity: Entity;
    type Model: From<Self::Entity> + Send;
    type Create: Send + 'static;
    type Update: Send + 'static;

    const MODEL_NAME: &'static str;
    const CREATE_UNIQUE_VALIDATION_MSG: &'static str = "Unknown unique constraint violation";
    const UPDATE_UNIQUE_VALIDATION_MSG: &'static str = "Unknown unique constraint violation";
}

pub struct BaseService<R, D> {
    data: D,
    _resource: PhantomData<fn() -> R>,
}

impl<R, D> BaseService<R, D>
where
    R: Resource,
    D: DataService<Entity = R::Entity, Create = R::Create, Update = R::Update>,
{
    pub fn new(data: D) -> Self {
        BaseService {
            data,
            _resource: PhantomData,
        }
    }

    fn not_found(id: Uuid) -> ErrorResult {
        ErrorResult::not_found(
            GET_BY_ID_NOT_FOUND_MSG
                .replace("{model_class}", R::MODEL_NAME)
                .replace("{id}", &id.to_string()),
        )
    }

    fn create_conflict_msg() -> String {
        format!("Failed to create new {} - {}", R::MODEL_NAME, R::CREATE_UNIQUE_VALIDATION_MSG)
            .replace("{model_class}", R::MODEL_NAME)
    }

    fn update_conflict_msg(id: Uuid) -> String {
        format!(
            "Failed to update {} with id {} - {}",
            R::MODEL_NAME,
            id,
            R::UPDATE_UNIQUE_VALIDATION_MSG
        )
        .replace("{model_class}", R::MODEL_NAME)
    }

    pub async fn get_page(&mut self, page: &PageRequest) -> ServiceResult<Page<R::Model>> {
        match self.data.get_page(page).await {
            Ok((entities, total)) => Ok(Page::new(entities, total).map(<R::Model as From<R::Entity>>::from)),
            Err(e @ (CrudError::InvalidSortField(_) | CrudError::InvalidFilterField(_))) => {
                Err(ErrorResult::bad_request(e.to_string()))
            }
            Err(e) => Err(ErrorResult::internal(e.to_string())),
        }
    }

    pub async fn get_by_id(&mut self, id: Uuid) -> ServiceResult<R::Model> {
        match self.data.get_by_id(id).await {
            Ok(Some(entity)) => Ok(entity.into()),
            Ok(None) => Err(Self::not_found(id)),
            Err(e) => Err(ErrorResult::internal(e.to_string())),
        }
    }

    pub async fn create(&mut self, model: R::Create, actor_id: &str) -> ServiceResult<R::Model> {
        match self.data.create(model, actor_id).await {
            Ok(entity) => Ok(entity.into()),
            Err(CrudError::UniqueViolation(message)) => {
                tracing::warn!(model = R::MODEL_NAME, "{}", message);
                Err(ErrorResult::conflict(Self::create_conflict_msg()))
            }
            Err(e) => Err(ErrorResult::internal(e.to_string())),
        }
    }

    /// Existence is checked first so a missing row is `NotFound`, never a no-op.
    pub async fn update(&mut self, id: Uuid, model: R::Update, actor_id: &str) -> ServiceResult<R::Model> {
        self.entity_exists(id).await?;
        match self.data.update(id, model, actor_id).await {
            Ok(Some(entity)) => Ok(entity.into()),
            Ok(None) => Err(Self::not_found(id)),
            Err(CrudError::UniqueViolation(message)) => {
                tracing::warn!(model = R::MODEL_NAME, %id, "{}", message);
                Err(ErrorResult::conflict(Self::update_conflict_msg(id)))
            }
            Err(e) => Err(ErrorResult::internal(e.to_string())),
        }
    }

    pub async fn delete(&mut self, id: Uuid, actor_id: &str) -> ServiceResult<()> {
        self.entity_exists(id).await?;
        match self.data.delete(id, actor_id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(Self::not_found(id)),
            Err(e) => Err(ErrorResult::internal(e.to_string())),
        }
    }

    pub async fn entity_exists(&mut self, id: Uuid) -> ServiceResult<()> {
        match self.data.entity_exists(id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(Self::not_found(id)),
            Err(e) => Err(ErrorResult::internal(e.to_string())),
        }
    }
}
