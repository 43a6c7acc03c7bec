use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;

/// Calendar-date layouts the analyzer is known to emit, tried in order once
/// a missing year has been appended ("Aug 29" becomes "Aug 29, 2025").
const STRUCTURED_FORMATS: &[&str] = &[
    "%b %d, %Y",
    "%B %d, %Y",
    "%a, %b %d, %Y",
    "%A, %b %d, %Y",
    "%a, %B %d, %Y",
    "%A, %B %d, %Y",
    "%Y-%m-%d",
    "%m/%d/%Y",
];

/// Sunday-first, matching the zero-based weekday numbering the offset
/// arithmetic below relies on. The first name contained in the phrase wins.
const WEEKDAY_NAMES: [&str; 7] = [
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

fn morning() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).expect("valid fixed time")
}

fn evening() -> NaiveTime {
    NaiveTime::from_hms_opt(19, 0, 0).expect("valid fixed time")
}

fn local_instant(date: NaiveDate, time: NaiveTime, timezone: Tz) -> Option<DateTime<Tz>> {
    timezone.from_local_datetime(&date.and_time(time)).earliest()
}

fn contains_four_digit_run(phrase: &str) -> bool {
    phrase
        .as_bytes()
        .windows(4)
        .any(|window| window.iter().all(u8::is_ascii_digit))
}

/// Tries the phrase as a concrete calendar date. Phrases without a 4-digit
/// year are resolved against the reference year instead of an epoch default.
/// Formats carrying a weekday name only match when the name agrees with the
/// date, so "Monday, Aug 29" falls through to the keyword pass.
fn parse_structured_date(phrase: &str, reference_year: i32) -> Option<NaiveDate> {
    let trimmed = phrase.trim();
    if trimmed.is_empty() {
        return None;
    }
    let candidate = if contains_four_digit_run(trimmed) {
        trimmed.to_string()
    } else {
        format!("{trimmed}, {reference_year}")
    };
    STRUCTURED_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&candidate, format).ok())
}

/// Maps a free-form due-date phrase to a concrete local instant, or `None`
/// when the phrase cannot be placed on a calendar.
///
/// A structured calendar date wins over every keyword; otherwise "tonight"
/// means the reference date at 19:00, "tomorrow" the next day at 09:00, and
/// a bare weekday name the next occurrence of that weekday at 09:00. A
/// weekday offset of exactly zero stays on the reference date; only weekdays
/// already past this week roll forward seven days.
pub fn resolve_due_date(phrase: &str, reference: DateTime<Tz>) -> Option<DateTime<Tz>> {
    let timezone = reference.timezone();
    let lowercase = phrase.to_lowercase();

    if let Some(date) = parse_structured_date(phrase, reference.year()) {
        let time = if lowercase.contains("tonight") {
            evening()
        } else {
            morning()
        };
        return local_instant(date, time, timezone);
    }

    let reference_date = reference.date_naive();
    if lowercase.contains("tonight") {
        return local_instant(reference_date, evening(), timezone);
    }
    if lowercase.contains("tomorrow") {
        return local_instant(reference_date + Duration::days(1), morning(), timezone);
    }

    let target_day = WEEKDAY_NAMES
        .iter()
        .position(|name| lowercase.contains(name))?;
    let current_day = reference.weekday().num_days_from_sunday() as i64;
    let mut day_difference = target_day as i64 - current_day;
    if day_difference < 0 {
        day_difference += 7;
    }
    local_instant(
        reference_date + Duration::days(day_difference),
        morning(),
        timezone,
    )
}

pub fn is_same_day(instant: DateTime<Tz>, day: NaiveDate) -> bool {
    instant.date_naive() == day
}

/// Monday on or before the given date; a Sunday maps to the previous Monday.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn week_days(date: NaiveDate) -> [NaiveDate; 7] {
    let start = start_of_week(date);
    std::array::from_fn(|index| start + Duration::days(index as i64))
}

/// Header label for the week containing `date`, collapsing to a single month
/// name when the week does not cross a month boundary. The year shown is the
/// start day's year.
pub fn format_week_range(date: NaiveDate) -> String {
    let start = start_of_week(date);
    let end = start + Duration::days(6);
    if start.month() == end.month() {
        format!(
            "{} {} - {}, {}",
            start.format("%B"),
            start.day(),
            end.day(),
            start.year()
        )
    } else {
        format!(
            "{} {} - {} {}, {}",
            start.format("%B"),
            start.day(),
            end.format("%B"),
            end.day(),
            start.year()
        )
    }
}
