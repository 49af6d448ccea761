//! API-facing models: DTOs, page envelopes and the service result types.

mod error_result;
mod page;
pub mod user;

pub use error_result::{ErrorResult, ErrorStatus, ServiceResult};
pub use page::{Page, PageRequest, SortDirection, DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE};
pub use user::{User, UserCreate, UserUpdate};
