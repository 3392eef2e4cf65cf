//! Shared test helpers for integration tests.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

use checkpoint_core::config::AppConfig;
use checkpoint_core::types::{Clock, EventId, ManualClock, UserId};
use checkpoint_database::store::{LedgerStore, UserDirectory};
use checkpoint_database::{MemoryLedgerStore, MemoryUserDirectory};
use checkpoint_entity::user::UserProfile;
use checkpoint_service::{EventContext, ScanRequest, ScanResult, Services};

/// Users known to every test app.
pub const USERS: [(&str, &str); 3] = [("U", "Una"), ("V", "Vic"), ("W", "Wen")];

/// Test application context
pub struct TestApp {
    /// Wired services
    pub services: Services,
    /// Clock shared by every service
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    /// Create a new test application on the in-memory backend
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryLedgerStore::new()))
    }

    /// Create a test application over a specific store
    pub fn with_store(store: Arc<dyn LedgerStore>) -> Self {
        let directory: Arc<dyn UserDirectory> = Arc::new(MemoryUserDirectory::with_users(
            USERS
                .iter()
                .map(|(id, name)| UserProfile::new(UserId::new(*id), *name)),
        ));
        Self::with_backends(store, directory)
    }

    /// Create a test application over a specific store and directory
    pub fn with_backends(store: Arc<dyn LedgerStore>, directory: Arc<dyn UserDirectory>) -> Self {
        let clock = Arc::new(ManualClock::new(start_time()));
        let dyn_clock: Arc<dyn Clock> = clock.clone();

        Self {
            services: Services::with_clock(&AppConfig::default(), store, directory, dyn_clock),
            clock,
        }
    }

    /// Issue a profile token for `user`
    pub fn profile_token(&self, user: &str) -> String {
        self.services
            .issuer
            .issue_profile(&UserId::new(user))
            .expect("Failed to issue profile code")
            .token
    }

    /// Scan a token as organizer `org` at `event`
    pub async fn scan_at(&self, token: String, event: &str, points: Option<i64>) -> ScanResult {
        self.services
            .scans
            .scan(&ScanRequest {
                token,
                organizer_id: UserId::new("org"),
                event: Some(EventContext {
                    event_id: EventId::new(event),
                    points_reward: points,
                }),
            })
            .await
    }

    /// Current balance for `user`
    pub async fn balance(&self, user: &str) -> i64 {
        self.services
            .points
            .get_balance(&UserId::new(user))
            .await
            .expect("Failed to read balance")
    }

    /// Move the shared clock forward
    pub fn advance(&self, by: TimeDelta) {
        self.clock.advance(by);
    }
}

fn start_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_760_000_000, 0).expect("valid timestamp")
}
