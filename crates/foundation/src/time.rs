/// Time primitives
use chrono::{Days, NaiveDate};

/// Seconds since the Unix epoch, as stored in `epoch_*_date` feature properties.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub struct EpochSeconds(pub f64);

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimeSpan {
    pub start: EpochSeconds,
    pub end: EpochSeconds,
}

impl TimeSpan {
    pub fn forever() -> Self {
        Self {
            start: EpochSeconds(f64::NEG_INFINITY),
            end: EpochSeconds(f64::INFINITY),
        }
    }

    pub fn instant(t: EpochSeconds) -> Self {
        Self { start: t, end: t }
    }

    /// Inclusive on both ends.
    pub fn contains(&self, t: EpochSeconds) -> bool {
        !(t.0 < self.start.0 || t.0 > self.end.0)
    }
}

/// Midnight UTC of `date`, in epoch seconds.
pub fn date_to_epoch(date: NaiveDate) -> EpochSeconds {
    let secs = date.and_hms_opt(0, 0, 0).map_or(0, |dt| dt.and_utc().timestamp());
    EpochSeconds(secs as f64)
}

/// `epoch + days`, saturating at the last representable date.
pub fn add_days(epoch: NaiveDate, days: u32) -> NaiveDate {
    epoch
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX)
}

/// Parses `YYYY-MM-DD`; blank input is `None`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Short human label, e.g. `Mon Jul 22 2024`.
pub fn date_label(date: NaiveDate) -> String {
    date.format("%a %b %d %Y").to_string()
}
