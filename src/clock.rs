use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::error::Error;

/// The shared "now" a group of displayed timestamps is measured against.
///
/// Seeded once, then advanced only by [`tick`](Self::tick) — never by
/// re-reading the system clock. Every subscriber computing its distance
/// against the same clock therefore lands in the same rounding bucket on
/// the same tick, even if the wall clock is corrected underneath.
#[derive(Debug, Clone, Default)]
pub struct ReferenceClock {
    server_time: Option<DateTime<Utc>>,
}

impl ReferenceClock {
    pub fn new() -> Self {
        Self { server_time: None }
    }

    /// Seed from the current system time. A no-op when already seeded.
    pub fn seed(&mut self) {
        self.seed_at(Utc::now());
    }

    /// Seed from an explicit timestamp. A no-op when already seeded.
    pub fn seed_at(&mut self, time: DateTime<Utc>) {
        if self.server_time.is_none() {
            debug!(server_time = %time, "Seeding reference clock");
            self.server_time = Some(time);
        }
    }

    pub fn is_seeded(&self) -> bool {
        self.server_time.is_some()
    }

    pub fn server_time(&self) -> Option<DateTime<Utc>> {
        self.server_time
    }

    /// Advance by exactly `refresh_millis` milliseconds. A no-op on an
    /// unseeded clock.
    pub fn tick(&mut self, refresh_millis: i64) {
        if let Some(time) = self.server_time {
            self.server_time = Some(time + Duration::milliseconds(refresh_millis));
        }
    }

    /// Milliseconds between the clock and `point`. Positive means `point`
    /// lies in the past of the clock.
    pub fn distance_from(&self, point: DateTime<Utc>) -> Result<i64, Error> {
        let server_time = self.server_time.ok_or(Error::ClockNotSeeded)?;
        Ok(server_time.signed_duration_since(point).num_milliseconds())
    }

    /// Return to the unseeded state; the next seed call re-seeds.
    pub fn reset(&mut self) {
        debug!("Resetting reference clock");
        self.server_time = None;
    }
}

/// Boundary parser for RFC 3339 source strings.
///
/// Input-string grammar handling otherwise belongs to the display-binding
/// collaborator; this is the thin default it can delegate to. Failure is
/// explicit so the caller can skip the entry instead of humanizing garbage.
pub fn parse_timestamp(source: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(source.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::InvalidTimestamp(format!("{:?}: {}", source, e)))
}
