//! In-memory storage for single-node deployments and tests.

pub mod directory;
pub mod ledger;

pub use directory::MemoryUserDirectory;
pub use ledger::MemoryLedgerStore;
