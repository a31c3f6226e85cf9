//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports, backed by
//! PostgreSQL via Diesel with async support through `diesel-async` and
//! `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: repository implementations only translate between
//!   Diesel models and domain types. No business logic resides here.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) are implementation details, never exposed
//!   to the domain layer.
//! - **Unit of work per call**: every operation checks out a pooled
//!   connection; multi-statement operations commit or roll back as one
//!   transaction, and the connection is released on every exit path.
//! - **Strongly typed errors**: all database errors are mapped to the
//!   domain's [`RepositoryError`](crate::domain::ports::RepositoryError).
//!
//! # Example
//!
//! ```ignore
//! use userstore::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/mydb")).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

mod diesel_profile_repository;
mod diesel_user_repository;
mod error_map;
mod migrate;
mod models;
mod pool;
mod schema;

pub use diesel_profile_repository::DieselProfileRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrate::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
