//! # checkpoint-service
//!
//! Business logic for Checkpoint: issuing and decoding QR tokens,
//! recording check-ins, keeping the points ledger, and turning a scan
//! into a result the organizer's device can show.
//!
//! Services take their dependencies through constructors as `Arc`
//! references. [`Services`] wires the whole graph from configuration.

pub mod checkin;
pub mod points;
pub mod qr;
pub mod scan;

use std::sync::Arc;

use checkpoint_core::config::AppConfig;
use checkpoint_core::types::{Clock, SystemClock};
use checkpoint_database::store::{LedgerStore, UserDirectory};

pub use checkin::{CheckInLedger, CheckInReceipt};
pub use points::{LedgerAudit, PointsLedger};
pub use qr::{IssuedCode, QrCodec, QrIssuer};
pub use scan::{
    EventContext, ScanFailure, ScanFailureKind, ScanRequest, ScanResult, ScanService, ScanSuccess,
};

/// The full service graph over one store and directory.
#[derive(Debug, Clone)]
pub struct Services {
    pub issuer: QrIssuer,
    pub codec: QrCodec,
    pub points: Arc<PointsLedger>,
    pub check_ins: Arc<CheckInLedger>,
    pub scans: Arc<ScanService>,
    pub directory: Arc<dyn UserDirectory>,
}

impl Services {
    /// Wire services on the wall clock.
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn LedgerStore>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self::with_clock(config, store, directory, Arc::new(SystemClock))
    }

    /// Wire services on an explicit clock.
    pub fn with_clock(
        config: &AppConfig,
        store: Arc<dyn LedgerStore>,
        directory: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let codec = QrCodec::with_clock(&config.qr, Arc::clone(&clock));
        let points = Arc::new(PointsLedger::new(store, Arc::clone(&clock)));
        let check_ins = Arc::new(CheckInLedger::new(Arc::clone(&points)));
        let scans = Arc::new(ScanService::new(
            codec.clone(),
            Arc::clone(&check_ins),
            Arc::clone(&directory),
            config.points.default_reward,
        ));

        Self {
            issuer: QrIssuer::new(codec.clone(), clock),
            codec,
            points,
            check_ins,
            scans,
            directory,
        }
    }
}
