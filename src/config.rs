use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde::de::Deserializer;

use crate::error::ConfigError;

/// A phrase template for one time bucket.
///
/// Either a literal string carrying at most one `%d` placeholder, or a
/// function computing the phrase from the rounded count and the raw distance
/// in milliseconds (for locales whose pluralization is not a two-form
/// singular/plural split).
#[derive(Clone)]
pub enum Template {
    Literal(String),
    Computed(Arc<dyn Fn(i64, i64) -> String + Send + Sync>),
}

impl Template {
    pub fn literal(s: impl Into<String>) -> Self {
        Template::Literal(s.into())
    }

    pub fn computed(f: impl Fn(i64, i64) -> String + Send + Sync + 'static) -> Self {
        Template::Computed(Arc::new(f))
    }

    /// Resolve the template to its raw string, before `%d` substitution.
    pub(crate) fn resolve(&self, count: i64, distance_millis: i64) -> String {
        match self {
            Template::Literal(s) => s.clone(),
            Template::Computed(f) => f(count, distance_millis),
        }
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Template::Literal(s) => f.debug_tuple("Literal").field(s).finish(),
            Template::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

// Config files can only express literal templates; computed ones are built
// in code.
impl<'de> Deserialize<'de> for Template {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Template::Literal(s))
    }
}

/// The full template table for phrase composition.
///
/// `numbers` is indexed by count: a non-empty entry at position `n` replaces
/// the numeral `n` in the rendered phrase (e.g. spelled-out words for small
/// counts). Missing or empty entries fall back to the digits.
#[derive(Debug, Clone, Deserialize)]
pub struct Strings {
    #[serde(default)]
    pub prefix_ago: Option<String>,
    #[serde(default)]
    pub prefix_from_now: Option<String>,
    #[serde(default = "default_suffix_ago")]
    pub suffix_ago: Option<String>,
    #[serde(default = "default_suffix_from_now")]
    pub suffix_from_now: Option<String>,

    #[serde(default = "default_seconds")]
    pub seconds: Template,
    #[serde(default = "default_minute")]
    pub minute: Template,
    #[serde(default = "default_minutes")]
    pub minutes: Template,
    #[serde(default = "default_hour")]
    pub hour: Template,
    #[serde(default = "default_hours")]
    pub hours: Template,
    #[serde(default = "default_day")]
    pub day: Template,
    #[serde(default = "default_days")]
    pub days: Template,
    #[serde(default = "default_month")]
    pub month: Template,
    #[serde(default = "default_months")]
    pub months: Template,
    #[serde(default = "default_year")]
    pub year: Template,
    #[serde(default = "default_years")]
    pub years: Template,

    #[serde(default = "default_time_separator")]
    pub time_separator: String,
    #[serde(default = "default_word_separator")]
    pub word_separator: String,
    #[serde(default)]
    pub numbers: Vec<String>,
}

/// Settings consumed by [`crate::humanize`].
#[derive(Debug, Clone, Deserialize)]
pub struct FormatConfig {
    /// When false, future distances render exactly like past ones.
    #[serde(default)]
    pub allow_future: bool,
    #[serde(default)]
    pub strings: Strings,
}

/// Top-level configuration: refresh cadence plus format settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Period of the refresh timer in milliseconds. A value <= 0 disables
    /// periodic refresh; only explicit manual refresh updates subscribers.
    #[serde(default = "default_refresh_millis")]
    pub refresh_millis: i64,
    #[serde(default)]
    pub format: FormatConfig,
}

fn default_suffix_ago() -> Option<String> {
    Some("ago".to_string())
}
fn default_suffix_from_now() -> Option<String> {
    Some("from now".to_string())
}
fn default_seconds() -> Template {
    Template::literal("less than a minute")
}
fn default_minute() -> Template {
    Template::literal("1 minute")
}
fn default_minutes() -> Template {
    Template::literal("%d minutes")
}
fn default_hour() -> Template {
    Template::literal("1 hour")
}
fn default_hours() -> Template {
    Template::literal("%d hours")
}
fn default_day() -> Template {
    Template::literal("a day")
}
fn default_days() -> Template {
    Template::literal("%d days")
}
fn default_month() -> Template {
    Template::literal("a month")
}
fn default_months() -> Template {
    Template::literal("%d months")
}
fn default_year() -> Template {
    Template::literal("a year")
}
fn default_years() -> Template {
    Template::literal("%d years")
}
fn default_time_separator() -> String {
    "and".to_string()
}
fn default_word_separator() -> String {
    " ".to_string()
}
fn default_refresh_millis() -> i64 {
    60_000
}

impl Default for Strings {
    fn default() -> Self {
        Self {
            prefix_ago: None,
            prefix_from_now: None,
            suffix_ago: default_suffix_ago(),
            suffix_from_now: default_suffix_from_now(),
            seconds: default_seconds(),
            minute: default_minute(),
            minutes: default_minutes(),
            hour: default_hour(),
            hours: default_hours(),
            day: default_day(),
            days: default_days(),
            month: default_month(),
            months: default_months(),
            year: default_year(),
            years: default_years(),
            time_separator: default_time_separator(),
            word_separator: default_word_separator(),
            numbers: Vec::new(),
        }
    }
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            allow_future: false,
            strings: Strings::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_millis: default_refresh_millis(),
            format: FormatConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit TOML file, or fall back to the
    /// built-in defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                toml::from_str::<Config>(&content)?
            }
            None => Config::default(),
        };
        config.format.validate()?;
        Ok(config)
    }
}

impl FormatConfig {
    /// Check every literal bucket template for at most one `%d` placeholder.
    ///
    /// A template with no placeholder is valid (the count is simply unused);
    /// more than one is a configuration error, caught here rather than at
    /// formatting time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.strings;
        let fields: [(&'static str, &Template); 11] = [
            ("seconds", &s.seconds),
            ("minute", &s.minute),
            ("minutes", &s.minutes),
            ("hour", &s.hour),
            ("hours", &s.hours),
            ("day", &s.day),
            ("days", &s.days),
            ("month", &s.month),
            ("months", &s.months),
            ("year", &s.year),
            ("years", &s.years),
        ];
        for (field, template) in fields {
            if let Template::Literal(text) = template
                && placeholder_count(text) > 1
            {
                return Err(ConfigError::Template { field });
            }
        }
        Ok(())
    }
}

/// Number of case-insensitive `%d` occurrences in a literal template.
fn placeholder_count(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut count = 0;
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'%' && (bytes[i + 1] == b'd' || bytes[i + 1] == b'D') {
            count += 1;
            i += 2;
        } else {
            i += 1;
        }
    }
    count
}
