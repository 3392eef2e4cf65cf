//! # checkpoint-database
//!
//! Persistence for the check-in and points ledgers. Defines the
//! [`LedgerStore`] unit-of-work interface and the [`UserDirectory`]
//! lookup, with a PostgreSQL implementation for production and an
//! in-memory implementation for single-node use and tests.

pub mod dispatch;
pub mod memory;
pub mod pool;
pub mod repositories;
pub mod store;

pub use dispatch::{DirectoryDispatch, LedgerStoreDispatch};
pub use memory::{MemoryLedgerStore, MemoryUserDirectory};
pub use repositories::{PgLedgerStore, PgUserDirectory};
pub use store::{LedgerStore, LedgerUnit, UserDirectory};
