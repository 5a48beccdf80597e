// Dashboard time range in Grafana's raw syntax
use chrono::{DateTime, Duration, Utc};

const DISPLAY_FORMAT: &str = "%a %b %e %H:%M:%S UTC %Y";

/// Time range as passed to Grafana, e.g. `now-6h` to `now`, or epoch millis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    pub from: String,
    pub to: String,
}

impl TimeRange {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// `"<from> to <to>"` with both bounds resolved against `now`.
    pub fn describe_at(&self, now: DateTime<Utc>) -> String {
        format!("{} to {}", format_raw(&self.from, now), format_raw(&self.to, now))
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::new("now-1h", "now")
    }
}

/// Human readable form of a raw bound. Values that cannot be resolved are
/// returned unchanged.
pub fn format_raw(raw: &str, now: DateTime<Utc>) -> String {
    match resolve(raw, now) {
        Some(instant) => instant.format(DISPLAY_FORMAT).to_string(),
        None => raw.to_string(),
    }
}

fn resolve(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
        return DateTime::from_timestamp_millis(raw.parse().ok()?);
    }

    let rest = raw.strip_prefix("now")?;
    // Rounding suffixes such as `now-1d/d` are not applied.
    let rest = rest.split('/').next().unwrap_or_default();
    if rest.is_empty() {
        return Some(now);
    }

    let (sign, offset) = if let Some(offset) = rest.strip_prefix('-') {
        (-1, offset)
    } else if let Some(offset) = rest.strip_prefix('+') {
        (1, offset)
    } else {
        return None;
    };
    let unit_at = offset.find(|c: char| !c.is_ascii_digit())?;
    let (amount, unit) = offset.split_at(unit_at);
    let amount: i64 = amount.parse().ok()?;
    let delta = match unit {
        "s" => Duration::try_seconds(amount)?,
        "m" => Duration::try_minutes(amount)?,
        "h" => Duration::try_hours(amount)?,
        "d" => Duration::try_days(amount)?,
        "w" => Duration::try_weeks(amount)?,
        "M" => Duration::try_days(amount.checked_mul(30)?)?,
        "y" => Duration::try_days(amount.checked_mul(365)?)?,
        _ => return None,
    };

    if sign < 0 {
        now.checked_sub_signed(delta)
    } else {
        now.checked_add_signed(delta)
    }
}
