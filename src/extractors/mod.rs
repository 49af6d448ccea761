//! Request extractors.

mod actor;

pub use actor::{ActorId, ACTOR_ID_HEADER, SYSTEM_ACTOR};
