//! Infrastructure layer: identity store adapters and start-up seeding.

pub mod postgres;
pub mod seed;

pub use postgres::PostgresIdentityStore;
pub use seed::{BootstrapAdmin, bootstrap_super_admin, seed_roles};
pub use warden_auth::InMemoryIdentityStore;
