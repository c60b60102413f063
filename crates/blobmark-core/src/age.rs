//! Relative age labels ("3 hours", "2 weeks").
//!
//! Bucket boundaries match the server-side renderer so a label refreshed in
//! the browser reads exactly like the one the page was served with.

use core::time::Duration;

use serde::Serialize;

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 365 * DAY;

/// Longest delay between refreshes.
pub const MAX_REFRESH: Duration = Duration::from_secs(DAY as u64);

/// Age bucket; doubles as the element's CSS class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AgeClass {
    Mins,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl AgeClass {
    pub const ALL: [Self; 6] = [
        Self::Mins,
        Self::Hours,
        Self::Days,
        Self::Weeks,
        Self::Months,
        Self::Years,
    ];

    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Mins => "age-mins",
            Self::Hours => "age-hours",
            Self::Days => "age-days",
            Self::Weeks => "age-weeks",
            Self::Months => "age-months",
            Self::Years => "age-years",
        }
    }

    #[must_use]
    pub fn from_css_class(class: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|age| age.css_class() == class)
    }

    const fn suffix(self) -> &'static str {
        match self {
            Self::Mins => "min.",
            Self::Hours => "hours",
            Self::Days => "days",
            Self::Weeks => "weeks",
            Self::Months => "months",
            Self::Years => "years",
        }
    }

    const fn unit_secs(self) -> i64 {
        match self {
            Self::Mins => MINUTE,
            Self::Hours => HOUR,
            Self::Days => DAY,
            Self::Weeks => WEEK,
            Self::Months => MONTH,
            Self::Years => YEAR,
        }
    }

    /// Ages strictly below this fall in the bucket. The months limit is
    /// shared with years, so years only applies past it.
    const fn limit_secs(self) -> i64 {
        match self {
            Self::Mins => 2 * HOUR,
            Self::Hours => 2 * DAY,
            Self::Days => 2 * WEEK,
            Self::Weeks => 2 * MONTH,
            Self::Months | Self::Years => 365 * 25 * 2 * HOUR,
        }
    }

    /// How soon a label in this bucket can change.
    #[must_use]
    pub const fn refresh_interval(self) -> Duration {
        match self {
            Self::Mins => Duration::from_secs(10),
            Self::Hours => Duration::from_secs(5 * MINUTE as u64),
            Self::Days => Duration::from_secs(30 * MINUTE as u64),
            Self::Weeks | Self::Months | Self::Years => MAX_REFRESH,
        }
    }
}

/// Rendered label for one timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgeLabel {
    pub text: String,
    pub class: AgeClass,
}

/// Label for an age in seconds. Negative ages (clock skew) render in the
/// minutes bucket.
#[must_use]
pub fn render_age(age_secs: i64) -> AgeLabel {
    let class = AgeClass::ALL
        .into_iter()
        .find(|class| age_secs < class.limit_secs())
        .unwrap_or(AgeClass::Years);
    AgeLabel {
        text: format!("{} {}", round_half_up(age_secs, class.unit_secs()), class.suffix()),
        class,
    }
}

/// Delay until the next refresh given the buckets currently on the page.
#[must_use]
pub fn refresh_interval<I>(present: I) -> Duration
where
    I: IntoIterator<Item = AgeClass>,
{
    present
        .into_iter()
        .map(AgeClass::refresh_interval)
        .min()
        .map_or(MAX_REFRESH, |interval| interval.min(MAX_REFRESH))
}

/// `round(value / unit)` with halves rounded towards positive infinity.
fn round_half_up(value: i64, unit: i64) -> i64 {
    (2 * value + unit).div_euclid(2 * unit)
}
