use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::clock::ReferenceClock;
use crate::config::{Config, FormatConfig};
use crate::error::Error;
use crate::humanize::humanize;

/// Anything holding a displayed timestamp that can recompute its phrase.
///
/// Implementations typically call [`ReferenceClock::distance_from`] with
/// their own point in time and run the result through
/// [`crate::humanize`]. An `Err` (e.g. the entry's source never parsed)
/// is logged and absorbed by the group; the entry keeps its previous text
/// and the remaining subscribers still refresh.
///
/// `refresh` must not call back into the owning [`ClockGroup`]: the group
/// lock is held for the whole refresh pass.
pub trait Refreshable: Send {
    fn refresh(&mut self, clock: &ReferenceClock, format: &FormatConfig) -> Result<(), Error>;
}

struct Inner {
    clock: ReferenceClock,
    format: FormatConfig,
    subscribers: Vec<Box<dyn Refreshable>>,
}

impl Inner {
    fn refresh_all(&mut self) {
        let Inner {
            clock,
            format,
            subscribers,
        } = self;
        for (idx, subscriber) in subscribers.iter_mut().enumerate() {
            if let Err(e) = subscriber.refresh(clock, format) {
                warn!(subscriber = idx, error = %e, "Subscriber refresh failed; keeping previous text");
            }
        }
    }

    fn tick_and_refresh(&mut self, refresh_millis: i64) {
        self.clock.tick(refresh_millis);
        self.refresh_all();
    }
}

/// A set of displayed timestamps refreshed in lockstep against one
/// [`ReferenceClock`].
///
/// The timer advances the clock by one `refresh_millis` step per tick and
/// then refreshes every subscriber synchronously, in registration order.
/// At most one timer runs per group; [`stop`](Self::stop) is idempotent
/// and also runs on drop.
pub struct ClockGroup {
    refresh_millis: i64,
    inner: Arc<Mutex<Inner>>,
    timer: Option<JoinHandle<()>>,
}

impl ClockGroup {
    pub fn new(config: Config) -> Self {
        Self {
            refresh_millis: config.refresh_millis,
            inner: Arc::new(Mutex::new(Inner {
                clock: ReferenceClock::new(),
                format: config.format,
                subscribers: Vec::new(),
            })),
            timer: None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed the clock from the current system time. A no-op when seeded.
    pub fn seed(&self) {
        self.lock().clock.seed();
    }

    /// Seed the clock from an explicit timestamp. A no-op when seeded.
    pub fn seed_at(&self, time: DateTime<Utc>) {
        self.lock().clock.seed_at(time);
    }

    /// Return the clock to the unseeded state; the next use re-seeds.
    pub fn reset(&self) {
        self.lock().clock.reset();
    }

    pub fn server_time(&self) -> Option<DateTime<Utc>> {
        self.lock().clock.server_time()
    }

    /// Register a subscriber. Seeds the clock from the system time if
    /// nothing seeded it yet, and refreshes the new subscriber once
    /// immediately.
    pub fn subscribe(&self, mut subscriber: Box<dyn Refreshable>) {
        let mut inner = self.lock();
        inner.clock.seed();
        if let Err(e) = subscriber.refresh(&inner.clock, &inner.format) {
            warn!(error = %e, "Initial subscriber refresh failed");
        }
        inner.subscribers.push(subscriber);
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Refresh every subscriber without advancing the clock. This is the
    /// manual path when `refresh_millis <= 0` disables the timer.
    pub fn refresh_all(&self) {
        self.lock().refresh_all();
    }

    /// One timer step, synchronously: advance the clock by `refresh_millis`,
    /// then refresh every subscriber in registration order.
    pub fn tick_once(&self) {
        self.lock().tick_and_refresh(self.refresh_millis);
    }

    /// Humanize a point in time against the current clock. Usable standalone
    /// (logs, APIs) without subscribing anything.
    pub fn phrase_for(&self, point: DateTime<Utc>) -> Result<String, Error> {
        let inner = self.lock();
        let distance = inner.clock.distance_from(point)?;
        Ok(humanize(distance, &inner.format))
    }

    /// Start the recurring refresh timer. Must be called within a tokio
    /// runtime. A no-op when `refresh_millis <= 0` or a timer is already
    /// running, so a second subscription group never creates a duplicate.
    pub fn start(&mut self) {
        if self.refresh_millis <= 0 {
            debug!(
                refresh_millis = self.refresh_millis,
                "Periodic refresh disabled"
            );
            return;
        }
        if self.timer.is_some() {
            debug!("Refresh timer already running");
            return;
        }

        let inner = Arc::clone(&self.inner);
        let refresh_millis = self.refresh_millis;
        let period = std::time::Duration::from_millis(refresh_millis as u64);
        debug!(refresh_millis, "Starting refresh timer");
        self.timer = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first interval tick completes immediately; the clock only
            // advances after a full period has elapsed.
            interval.tick().await;
            loop {
                interval.tick().await;
                inner
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .tick_and_refresh(refresh_millis);
            }
        }));
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Cancel the refresh timer so no further ticks occur. Idempotent.
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            debug!("Stopping refresh timer");
            timer.abort();
        }
    }
}

impl Drop for ClockGroup {
    fn drop(&mut self) {
        self.stop();
    }
}
