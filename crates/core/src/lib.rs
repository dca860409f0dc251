//! `warden-core`: identifiers and the outward error taxonomy shared by every
//! layer of the identity service.
//!
//! Nothing in here performs IO.

pub mod error;
pub mod id;

pub use error::{AccessError, AccessResult};
pub use id::{RoleId, UserId};
