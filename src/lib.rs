//! Layered REST API boilerplate: generic CRUD over PostgreSQL with typed
//! service results, pagination, filtering, sorting and soft delete.

pub mod case;
pub mod config;
pub mod data;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod mappers;
pub mod migration;
pub mod models;
pub mod openapi;
pub mod response;
pub mod routes;
pub mod service;
pub mod session;
pub mod sql;
pub mod state;

pub use config::AppConfig;
pub use data::{Crud, DataService, Filter, FilterOp, UserDataService};
pub use error::{AppError, ConfigError, CrudError};
pub use migration::{apply_migrations, apply_schema, ensure_database_exists};
pub use models::{ErrorResult, ErrorStatus, Page, PageRequest, ServiceResult, SortDirection};
pub use routes::app_router;
pub use service::{BaseService, Resource, UserService};
pub use session::RequestSession;
pub use state::AppState;
