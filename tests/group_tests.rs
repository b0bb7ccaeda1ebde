use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use relatime::clock::ReferenceClock;
use relatime::config::{Config, FormatConfig};
use relatime::error::Error;
use relatime::group::{ClockGroup, Refreshable};
use relatime::humanize::humanize;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap()
}

/// A minimal display entry: holds its own timestamp and the last phrase
/// rendered for it.
struct Entry {
    at: DateTime<Utc>,
    rendered: Arc<Mutex<Option<String>>>,
}

impl Entry {
    fn new(at: DateTime<Utc>) -> (Self, Arc<Mutex<Option<String>>>) {
        let rendered = Arc::new(Mutex::new(None));
        (
            Self {
                at,
                rendered: rendered.clone(),
            },
            rendered,
        )
    }
}

impl Refreshable for Entry {
    fn refresh(&mut self, clock: &ReferenceClock, format: &FormatConfig) -> Result<(), Error> {
        let distance = clock.distance_from(self.at)?;
        *self.rendered.lock().unwrap() = Some(humanize(distance, format));
        Ok(())
    }
}

/// Records the order in which it is refreshed.
struct OrderedEntry {
    name: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl Refreshable for OrderedEntry {
    fn refresh(&mut self, _clock: &ReferenceClock, _format: &FormatConfig) -> Result<(), Error> {
        self.log.lock().unwrap().push(self.name);
        Ok(())
    }
}

/// An entry whose source never parsed; refresh always fails.
struct BrokenEntry;

impl Refreshable for BrokenEntry {
    fn refresh(&mut self, _clock: &ReferenceClock, _format: &FormatConfig) -> Result<(), Error> {
        Err(Error::InvalidTimestamp("<unparseable source>".to_string()))
    }
}

fn group_with_interval(refresh_millis: i64) -> ClockGroup {
    let mut config = Config::default();
    config.refresh_millis = refresh_millis;
    ClockGroup::new(config)
}

#[test]
fn test_subscribe_seeds_clock() {
    let group = ClockGroup::new(Config::default());
    assert!(group.server_time().is_none());

    let (entry, _rendered) = Entry::new(Utc::now());
    group.subscribe(Box::new(entry));
    assert!(group.server_time().is_some());
    assert_eq!(group.subscriber_count(), 1);
}

#[test]
fn test_subscribe_does_not_overwrite_seeded_clock() {
    let group = ClockGroup::new(Config::default());
    group.seed_at(base_time());

    let (entry, _rendered) = Entry::new(base_time());
    group.subscribe(Box::new(entry));
    assert_eq!(group.server_time(), Some(base_time()));
}

#[test]
fn test_subscribe_refreshes_immediately() {
    let group = ClockGroup::new(Config::default());
    group.seed_at(base_time());

    let (entry, rendered) = Entry::new(base_time());
    group.subscribe(Box::new(entry));
    assert_eq!(
        rendered.lock().unwrap().as_deref(),
        Some("less than a minute ago")
    );
}

#[test]
fn test_tick_once_advances_clock_and_refreshes() {
    let group = group_with_interval(60_000);
    group.seed_at(base_time());

    let (entry, rendered) = Entry::new(base_time());
    group.subscribe(Box::new(entry));

    group.tick_once();
    assert_eq!(group.server_time(), Some(base_time() + Duration::minutes(1)));
    assert_eq!(rendered.lock().unwrap().as_deref(), Some("1 minute ago"));
}

#[test]
fn test_refresh_all_does_not_advance_clock() {
    let group = group_with_interval(60_000);
    group.seed_at(base_time());

    let (entry, rendered) = Entry::new(base_time() - Duration::minutes(5));
    group.subscribe(Box::new(entry));

    group.refresh_all();
    assert_eq!(group.server_time(), Some(base_time()));
    assert_eq!(rendered.lock().unwrap().as_deref(), Some("5 minutes ago"));
}

#[test]
fn test_subscribers_refresh_in_registration_order() {
    let group = ClockGroup::new(Config::default());
    let log = Arc::new(Mutex::new(Vec::new()));
    for name in ["a", "b", "c"] {
        group.subscribe(Box::new(OrderedEntry {
            name,
            log: log.clone(),
        }));
    }

    log.lock().unwrap().clear();
    group.tick_once();
    assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
}

#[test]
fn test_failed_refresh_is_absorbed() {
    let group = group_with_interval(60_000);
    group.seed_at(base_time());

    group.subscribe(Box::new(BrokenEntry));
    let (entry, rendered) = Entry::new(base_time());
    group.subscribe(Box::new(entry));

    // The broken entry neither updates nor prevents the healthy one from
    // refreshing.
    group.tick_once();
    assert_eq!(rendered.lock().unwrap().as_deref(), Some("1 minute ago"));
}

#[test]
fn test_phrase_for() {
    let group = ClockGroup::new(Config::default());
    group.seed_at(base_time());
    let phrase = group.phrase_for(base_time() - Duration::minutes(2)).unwrap();
    assert_eq!(phrase, "2 minutes ago");
}

#[test]
fn test_phrase_for_future_with_allow_future() {
    let mut config = Config::default();
    config.format.allow_future = true;
    let group = ClockGroup::new(config);
    group.seed_at(base_time());

    let phrase = group.phrase_for(base_time() + Duration::minutes(2)).unwrap();
    assert_eq!(phrase, "2 minutes from now");
}

#[test]
fn test_phrase_for_unseeded_clock_fails() {
    let group = ClockGroup::new(Config::default());
    let result = group.phrase_for(base_time());
    assert!(matches!(result, Err(Error::ClockNotSeeded)));
}

#[test]
fn test_reset_allows_reseeding_through_group() {
    let group = ClockGroup::new(Config::default());
    group.seed_at(base_time());
    group.reset();
    assert!(group.server_time().is_none());

    let later = base_time() + Duration::hours(1);
    group.seed_at(later);
    assert_eq!(group.server_time(), Some(later));
}

#[tokio::test]
async fn test_start_with_disabled_refresh_is_noop() {
    let mut group = group_with_interval(0);
    group.start();
    assert!(!group.is_running());

    let mut group = group_with_interval(-5);
    group.start();
    assert!(!group.is_running());
}

#[tokio::test]
async fn test_start_twice_keeps_single_timer() {
    let mut group = group_with_interval(60_000);
    group.start();
    group.start();
    assert!(group.is_running());
    group.stop();
    assert!(!group.is_running());
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let mut group = group_with_interval(60_000);
    group.start();
    group.stop();
    group.stop();
    assert!(!group.is_running());
}

#[tokio::test]
async fn test_stop_without_start_is_safe() {
    let mut group = group_with_interval(60_000);
    group.stop();
    assert!(!group.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_timer_ticks_advance_clock_in_lockstep() {
    let mut group = group_with_interval(1000);
    group.seed_at(base_time());
    let (entry, rendered) = Entry::new(base_time());
    group.subscribe(Box::new(entry));

    group.start();
    // Let the timer task start up and arm its interval.
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    for ticks in 1..=3_i64 {
        tokio::time::advance(std::time::Duration::from_millis(1000)).await;
        for _ in 0..100 {
            tokio::task::yield_now().await;
            if group.server_time() == Some(base_time() + Duration::milliseconds(ticks * 1000)) {
                break;
            }
        }
        assert_eq!(
            group.server_time(),
            Some(base_time() + Duration::milliseconds(ticks * 1000))
        );
    }
    assert!(rendered.lock().unwrap().is_some());

    group.stop();
    let stopped_at = group.server_time();
    tokio::time::advance(std::time::Duration::from_millis(5000)).await;
    for _ in 0..100 {
        tokio::task::yield_now().await;
    }
    assert_eq!(group.server_time(), stopped_at);
}
