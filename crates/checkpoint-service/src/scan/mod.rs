//! Scan handling: orchestration and result formatting.

pub mod formatter;
pub mod service;

pub use formatter::{
    ScanFailure, ScanFailureKind, ScanResult, ScanSuccess, format_failure, format_result,
};
pub use service::{EventContext, ScanRequest, ScanService, ScanStage};
