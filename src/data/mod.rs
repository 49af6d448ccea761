//! Data-access layer: filters, the generic CRUD component and per-entity aliases.

mod crud;
mod filter;
mod user;

pub use crud::{Crud, DataService};
pub use filter::{Filter, FilterOp};
pub use user::UserDataService;
