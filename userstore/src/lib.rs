//! User-management data layer over PostgreSQL.
//!
//! The crate provides plain domain records ([`domain::User`],
//! [`domain::Profile`]), validation schemas for API payloads, repository
//! ports with a generic CRUD contract, and Diesel-backed adapters
//! implementing those ports, together with configuration and logging glue.
//!
//! It exposes no network surface of its own; an external API layer
//! constructs the adapters with a [`outbound::persistence::DbPool`] and
//! works through the [`domain::ports`] traits.

pub mod config;
pub mod domain;
pub mod outbound;
pub mod telemetry;

pub use config::{ApiSettings, DatabaseSettings};
pub use domain::{
    EntityRepository, NewProfile, NewUser, Profile, ProfileDraft, ProfileRepository, Role,
    RepositoryError, User, UserDraft, UserRepository,
};
pub use outbound::persistence::{DbPool, DieselProfileRepository, DieselUserRepository, PoolConfig};
