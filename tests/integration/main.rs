//! Integration tests for the scan flow.
//!
//! Most tests run on the in-memory backend. `postgres_test` runs against
//! the database named by `DATABASE_URL` and is skipped when it is unset.

mod helpers;

mod ledger_test;
mod postgres_test;
mod scan_test;
mod storage_test;
