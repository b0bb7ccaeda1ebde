//! Fuzzy relative-time phrases ("4 minutes ago", "a day from now") kept in
//! sync against a shared reference clock.
//!
//! The crate has two halves. [`humanize`] is a pure function turning a signed
//! distance in milliseconds into a phrase, driven entirely by a
//! [`FormatConfig`]. [`ClockGroup`] keeps a set of displayed timestamps
//! consistent: it owns a [`ReferenceClock`] that advances by a fixed step on
//! each timer tick instead of re-reading the system clock, so every
//! subscriber lands in the same rounding bucket on the same tick.
//!
//! ```
//! use relatime::{FormatConfig, humanize};
//!
//! let config = FormatConfig::default();
//! assert_eq!(humanize(60_000, &config), "1 minute ago");
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod group;
pub mod humanize;

pub use clock::{ReferenceClock, parse_timestamp};
pub use config::{Config, FormatConfig, Strings, Template};
pub use error::{ConfigError, Error};
pub use group::{ClockGroup, Refreshable};
pub use humanize::humanize;
