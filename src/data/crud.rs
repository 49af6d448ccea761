//! Generic CRUD execution against PostgreSQL.

use crate::case::to_snake_case;
use crate::data::Filter;
use crate::entity::Entity;
use crate::error::CrudError;
use crate::mappers::Mapper;
use crate::models::PageRequest;
use crate::sql::{self, PgBindValue, QueryBuf};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::{Query, QueryAs, QueryScalar};
use sqlx::PgConnection;
use std::marker::PhantomData;
use uuid::Uuid;

/// Persistence capabilities a service needs for one entity.
///
/// Implementations run inside the caller's unit of work and never commit or
/// roll back. Only active rows are visible to reads, updates and deletes.
#[async_trait]
pub trait DataService: Send {
    type Entity: Entity;
    type Create: Send + 'static;
    type Update: Send + 'static;

    async fn entity_exists(&mut self, id: Uuid) -> Result<bool, CrudError>;

    /// Whether any row matches the filters, with the same active-row rule as `get_page`.
    async fn condition_exists(&mut self, filters: &[Filter]) -> Result<bool, CrudError>;

    async fn get_by_id(&mut self, id: Uuid) -> Result<Option<Self::Entity>, CrudError>;

    /// `get_by_id` that row-locks the match until the unit of work ends.
    async fn get_by_id_for_update(&mut self, id: Uuid) -> Result<Option<Self::Entity>, CrudError>;

    /// Matching rows for the requested window, plus the total match count.
    async fn get_page(&mut self, page: &PageRequest) -> Result<(Vec<Self::Entity>, u64), CrudError>;

    async fn create(&mut self, model: Self::Create, actor_id: &str) -> Result<Self::Entity, CrudError>;

    /// Applies only the fields present in `model` (serialized field names are
    /// mapped to snake_case columns). `None` when no active row has `id`.
    async fn update(
        &mut self,
        id: Uuid,
        model: Self::Update,
        actor_id: &str,
    ) -> Result<Option<Self::Entity>, CrudError>;

    /// Soft delete. `false` when no active row has `id`.
    async fn delete(&mut self, id: Uuid, actor_id: &str) -> Result<bool, CrudError>;

    /// Soft delete every active row matching the filters; returns how many were deleted.
    async fn condition_delete(&mut self, filters: &[Filter], actor_id: &str) -> Result<u64, CrudError>;
}

/// [`DataService`] for any entity, borrowing the request's connection.
pub struct Crud<'c, E, C, U> {
    conn: &'c mut PgConnection,
    schema: &'c str,
    mapper: Mapper<E, C>,
    _update: PhantomData<fn(U)>,
}

impl<'c, E, C, U> Crud<'c, E, C, U>
where
    E: Entity,
{
    pub fn new(conn: &'c mut PgConnection, schema: &'c str, mapper: Mapper<E, C>) -> Self {
        Crud {
            conn,
            schema,
            mapper,
            _update: PhantomData,
        }
    }

    fn query_as(q: &QueryBuf) -> QueryAs<'_, Postgres, E, PgArguments> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_as::<_, E>(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from(p));
        }
        query
    }

    fn query_scalar<O>(q: &QueryBuf) -> QueryScalar<'_, Postgres, O, PgArguments>
    where
        O: Send + Unpin,
        (O,): for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow>,
    {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<_, O>(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from(p));
        }
        query
    }

    fn query(q: &QueryBuf) -> Query<'_, Postgres, PgArguments> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from(p));
        }
        query
    }
}

/// Serialize a model or entity into a column → value map.
fn to_row<T: Serialize>(value: &T) -> Result<Map<String, Value>, sqlx::Error> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(sqlx::Error::Encode("value must serialize to a JSON object".into())),
        Err(e) => Err(sqlx::Error::Encode(Box::new(e))),
    }
}

fn log_failure(err: CrudError) -> CrudError {
    match &err {
        CrudError::Database { message, source } => tracing::error!(error = %source, "{}", message),
        other => tracing::error!("{}", other),
    }
    err
}

#[async_trait]
impl<'c, E, C, U> DataService for Crud<'c, E, C, U>
where
    E: Entity,
    C: Send + 'static,
    U: Serialize + Send + 'static,
{
    type Entity = E;
    type Create = C;
    type Update = U;

    async fn entity_exists(&mut self, id: Uuid) -> Result<bool, CrudError> {
        let q = sql::exists_by_id::<E>(self.schema, id);
        Self::query_scalar::<bool>(&q)
            .fetch_one(&mut *self.conn)
            .await
            .map_err(|e| {
                log_failure(CrudError::database(
                    format!("Failed to check if entity {} with id {} exists", E::NAME, id),
                    e,
                ))
            })
    }

    async fn condition_exists(&mut self, filters: &[Filter]) -> Result<bool, CrudError> {
        let q = sql::exists_where::<E>(self.schema, filters).map_err(log_failure)?;
        Self::query_scalar::<bool>(&q)
            .fetch_one(&mut *self.conn)
            .await
            .map_err(|e| {
                log_failure(CrudError::database(
                    format!("Failed to check if entities {} exist for conditions {:?}", E::NAME, filters),
                    e,
                ))
            })
    }

    async fn get_by_id(&mut self, id: Uuid) -> Result<Option<E>, CrudError> {
        let q = sql::select_by_id::<E>(self.schema, id);
        Self::query_as(&q)
            .fetch_optional(&mut *self.conn)
            .await
            .map_err(|e| log_failure(CrudError::database(format!("Failed to retrieve {} with id {}", E::NAME, id), e)))
    }

    async fn get_by_id_for_update(&mut self, id: Uuid) -> Result<Option<E>, CrudError> {
        let q = sql::select_by_id_for_update::<E>(self.schema, id);
        Self::query_as(&q)
            .fetch_optional(&mut *self.conn)
            .await
            .map_err(|e| log_failure(CrudError::database(format!("Failed to retrieve {} with id {}", E::NAME, id), e)))
    }

    async fn get_page(&mut self, page: &PageRequest) -> Result<(Vec<E>, u64), CrudError> {
        let (q, count) = sql::select_page::<E>(self.schema, page)?;
        let failed = |e: sqlx::Error| {
            log_failure(CrudError::database(
                format!(
                    "Failed to retrieve multiple entities {} with params: page_number={}, page_size={}, omit_pagination={}",
                    E::NAME,
                    page.page_number,
                    page.page_size,
                    page.omit_pagination
                ),
                e,
            ))
        };
        let items = match q {
            Some(q) => Self::query_as(&q).fetch_all(&mut *self.conn).await.map_err(failed)?,
            None => Vec::new(),
        };
        let total = Self::query_scalar::<i64>(&count)
            .fetch_one(&mut *self.conn)
            .await
            .map_err(failed)?;
        Ok((items, u64::try_from(total).unwrap_or_default()))
    }

    async fn create(&mut self, model: C, actor_id: &str) -> Result<E, CrudError> {
        let entity = (self.mapper)(model, actor_id);
        let message = format!("Failed to create new entity {}", E::NAME);
        let row = to_row(&entity).map_err(|e| log_failure(CrudError::database(message.clone(), e)))?;
        let q = sql::insert::<E>(self.schema, &row);
        Self::query_as(&q)
            .fetch_one(&mut *self.conn)
            .await
            .map_err(|e| log_failure(CrudError::from_write(message, e)))
    }

    async fn update(&mut self, id: Uuid, model: U, actor_id: &str) -> Result<Option<E>, CrudError> {
        let message = format!("Failed to update entity {} {}", E::NAME, id);
        let changes: Map<String, Value> = to_row(&model)
            .map_err(|e| log_failure(CrudError::database(message.clone(), e)))?
            .into_iter()
            .map(|(k, v)| (to_snake_case(&k), v))
            .collect();
        let fields: Vec<&String> = changes.keys().collect();
        tracing::info!(entity = E::NAME, %id, fields = ?fields, "update");
        let q = sql::update::<E>(self.schema, id, &changes, actor_id);
        Self::query_as(&q)
            .fetch_optional(&mut *self.conn)
            .await
            .map_err(|e| log_failure(CrudError::from_write(message, e)))
    }

    async fn delete(&mut self, id: Uuid, actor_id: &str) -> Result<bool, CrudError> {
        let q = sql::soft_delete::<E>(self.schema, id, actor_id);
        let result = Self::query(&q)
            .execute(&mut *self.conn)
            .await
            .map_err(|e| log_failure(CrudError::database(format!("Failed to delete entity {} {}", E::NAME, id), e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn condition_delete(&mut self, filters: &[Filter], actor_id: &str) -> Result<u64, CrudError> {
        let q = sql::soft_delete_where::<E>(self.schema, filters, actor_id).map_err(log_failure)?;
        let result = Self::query(&q).execute(&mut *self.conn).await.map_err(|e| {
            log_failure(CrudError::database(
                format!("Failed to delete entities {} for conditions {:?}", E::NAME, filters),
                e,
            ))
        })?;
        let deleted = result.rows_affected();
        tracing::info!(entity = E::NAME, deleted, "condition delete");
        Ok(deleted)
    }
}
