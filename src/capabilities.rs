//! Platform capabilities consumed by the flows: notification permission and
//! the time source used to seed scoring.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Asks the platform for permission to post notifications.
///
/// Single-shot from the flow's point of view; the answer is whatever the
/// platform dialog returned.
#[async_trait]
pub trait NotificationPermission: Send + Sync {
    async fn request(&self) -> bool;
}

/// Source of "now". Injected so scoring stays reproducible in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Permission capability that never shows a dialog. Used by the terminal
/// demo, where there is no platform to ask.
#[derive(Debug, Clone, Copy)]
pub struct StaticPermission(pub bool);

#[async_trait]
impl NotificationPermission for StaticPermission {
    async fn request(&self) -> bool {
        self.0
    }
}
