//! Services: typed results over the data layer, plus request validation.

mod base;
mod user;
mod validation;


pub use base::{BaseService, Resource};
pub use user::{UserResource, UserService};
pub use validation::{Validate, MAX_TEXT_LENGTH};
