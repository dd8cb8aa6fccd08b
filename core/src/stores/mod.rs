//! Store implementations: in-memory (tests, databaseless development) and
//! `PostgreSQL` (production).

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryCatalogStore, InMemoryOrderStore};
pub use postgres::{PostgresCatalogStore, PostgresOrderStore};
