use crate::config::{FormatConfig, Strings, Template};

/// One entry of the bucket chain, carrying the already-rounded display count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Seconds(i64),
    Minute,
    Minutes(i64),
    Hour { remainder: i64 },
    Hours { count: i64, remainder: i64 },
    Day,
    Days(i64),
    Month,
    Months(i64),
    Year,
    Years(i64),
}

/// Map a distance magnitude onto a bucket.
///
/// The chain is evaluated strictly top to bottom and the order is part of
/// the observable contract: boundary checks use the unrounded magnitude
/// while the displayed count is rounded separately, so 44.6s still renders
/// through the `seconds` template even though its count rounds to 45. Do
/// not reorder or normalize the thresholds.
pub fn select_bucket(distance_millis: i64) -> Bucket {
    let seconds = distance_millis.unsigned_abs() as f64 / 1000.0;
    let minutes = seconds / 60.0;
    let hours = minutes / 60.0;
    let remaining_minutes = minutes % 60.0;
    let days = hours / 24.0;
    let years = days / 365.0;

    if seconds < 45.0 {
        Bucket::Seconds(seconds.round() as i64)
    } else if seconds < 90.0 {
        Bucket::Minute
    } else if minutes < 60.0 {
        Bucket::Minutes(minutes.round() as i64)
    } else if minutes < 120.0 {
        Bucket::Hour {
            remainder: remaining_minutes.round() as i64,
        }
    } else if hours < 24.0 {
        Bucket::Hours {
            count: hours.round() as i64,
            remainder: remaining_minutes.round() as i64,
        }
    } else if hours < 42.0 {
        Bucket::Day
    } else if days < 30.0 {
        Bucket::Days(days.round() as i64)
    } else if days < 45.0 {
        Bucket::Month
    } else if days < 365.0 {
        Bucket::Months((days / 30.0).round() as i64)
    } else if years < 1.5 {
        Bucket::Year
    } else {
        Bucket::Years(years.round() as i64)
    }
}

/// Format a signed distance in milliseconds as a relative-time phrase.
///
/// Positive distances lie in the past of the reference clock, negative ones
/// in its future. Pure and deterministic; never fails.
pub fn humanize(distance_millis: i64, config: &FormatConfig) -> String {
    let s = &config.strings;
    let (prefix, suffix) = if config.allow_future && distance_millis < 0 {
        (&s.prefix_from_now, &s.suffix_from_now)
    } else {
        (&s.prefix_ago, &s.suffix_ago)
    };

    let phrase = match select_bucket(distance_millis) {
        Bucket::Seconds(n) => substitute(&s.seconds, n, distance_millis, s),
        Bucket::Minute => substitute(&s.minute, 1, distance_millis, s),
        Bucket::Minutes(n) => substitute(&s.minutes, n, distance_millis, s),
        Bucket::Hour { remainder } => {
            let mut words = substitute(&s.hour, 1, distance_millis, s);
            words.push_str(&remainder_phrase(remainder, distance_millis, s));
            words
        }
        Bucket::Hours { count, remainder } => {
            let mut words = substitute(&s.hours, count, distance_millis, s);
            words.push_str(&remainder_phrase(remainder, distance_millis, s));
            words
        }
        Bucket::Day => substitute(&s.day, 1, distance_millis, s),
        Bucket::Days(n) => substitute(&s.days, n, distance_millis, s),
        Bucket::Month => substitute(&s.month, 1, distance_millis, s),
        Bucket::Months(n) => substitute(&s.months, n, distance_millis, s),
        Bucket::Year => substitute(&s.year, 1, distance_millis, s),
        Bucket::Years(n) => substitute(&s.years, n, distance_millis, s),
    };

    let mut parts: Vec<&str> = Vec::with_capacity(3);
    if let Some(prefix) = prefix.as_deref()
        && !prefix.is_empty()
    {
        parts.push(prefix);
    }
    parts.push(&phrase);
    if let Some(suffix) = suffix.as_deref()
        && !suffix.is_empty()
    {
        parts.push(suffix);
    }
    parts.join(s.word_separator.as_str()).trim().to_string()
}

/// Resolve a template and splice the numeral into its `%d` placeholder.
fn substitute(template: &Template, count: i64, distance_millis: i64, s: &Strings) -> String {
    let raw = template.resolve(count, distance_millis);
    let numeral = numeral_for(count, &s.numbers);
    replace_placeholder(&raw, &numeral)
}

/// The display numeral for a count: a non-empty `numbers` entry when one
/// exists at that index, otherwise the digits.
fn numeral_for(count: i64, numbers: &[String]) -> String {
    usize::try_from(count)
        .ok()
        .and_then(|i| numbers.get(i))
        .filter(|word| !word.is_empty())
        .cloned()
        .unwrap_or_else(|| count.to_string())
}

/// Replace the first case-insensitive `%d` occurrence. Templates without a
/// placeholder come back unchanged.
fn replace_placeholder(template: &str, numeral: &str) -> String {
    let bytes = template.as_bytes();
    for i in 0..bytes.len().saturating_sub(1) {
        if bytes[i] == b'%' && (bytes[i + 1] == b'd' || bytes[i + 1] == b'D') {
            let mut out = String::with_capacity(template.len() + numeral.len());
            out.push_str(&template[..i]);
            out.push_str(numeral);
            out.push_str(&template[i + 2..]);
            return out;
        }
    }
    template.to_string()
}

/// The "and N minutes" tail appended to hour buckets. Empty when the
/// leftover rounds to zero.
fn remainder_phrase(remainder: i64, distance_millis: i64, s: &Strings) -> String {
    if remainder == 0 {
        return String::new();
    }
    let words = if remainder == 1 {
        substitute(&s.minute, 1, distance_millis, s)
    } else {
        substitute(&s.minutes, remainder, distance_millis, s)
    };
    format!(
        "{}{}{}{}",
        s.word_separator, s.time_separator, s.word_separator, words
    )
}
