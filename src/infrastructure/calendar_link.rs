use crate::domain::models::Task;
use crate::infrastructure::error::InfraError;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use url::Url;

const CALENDAR_RENDER_ENDPOINT: &str = "https://www.google.com/calendar/render";

/// Google Calendar event-template link for a task whose due-date phrase has
/// already been resolved. The event spans one hour from the resolved start.
pub fn build_event_url(task: &Task, start: DateTime<Tz>) -> Result<Url, InfraError> {
    let start_utc = start.with_timezone(&Utc);
    let end_utc = start_utc + Duration::hours(1);

    let mut url = Url::parse(CALENDAR_RENDER_ENDPOINT).map_err(|error| {
        InfraError::InvalidConfig(format!("invalid calendar render url: {error}"))
    })?;
    url.query_pairs_mut()
        .append_pair("action", "TEMPLATE")
        .append_pair("text", &task.task_name)
        .append_pair(
            "dates",
            &format!(
                "{}/{}",
                format_calendar_instant(start_utc),
                format_calendar_instant(end_utc)
            ),
        )
        .append_pair("details", &format!("Task for subject: {}", task.subject));
    Ok(url)
}

/// Basic ISO 8601 without punctuation, the format the render endpoint expects.
fn format_calendar_instant(value: DateTime<Utc>) -> String {
    value.format("%Y%m%dT%H%M%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Priority;
    use chrono::TimeZone;
    use chrono_tz::Asia::Riyadh;
    use std::collections::HashMap;

    fn sample_task() -> Task {
        Task {
            id: "tsk-1".to_string(),
            task_name: "Write the first draft of the history essay".to_string(),
            subject: "History".to_string(),
            due_date: "Friday, Aug 29".to_string(),
            priority: Priority::Medium,
            is_completed: false,
            reminder_set: false,
        }
    }

    fn query_map(url: &Url) -> HashMap<String, String> {
        url.query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    #[test]
    fn event_url_carries_template_parameters() {
        let start = Riyadh
            .with_ymd_and_hms(2025, 8, 29, 9, 0, 0)
            .single()
            .expect("valid local time");
        let url = build_event_url(&sample_task(), start).expect("build url");

        assert_eq!(url.host_str(), Some("www.google.com"));
        assert_eq!(url.path(), "/calendar/render");

        let query = query_map(&url);
        assert_eq!(query.get("action").map(String::as_str), Some("TEMPLATE"));
        assert_eq!(
            query.get("text").map(String::as_str),
            Some("Write the first draft of the history essay")
        );
        assert_eq!(
            query.get("details").map(String::as_str),
            Some("Task for subject: History")
        );
    }

    #[test]
    fn event_spans_one_hour_in_utc_basic_format() {
        // 09:00 in Riyadh is 06:00 UTC.
        let start = Riyadh
            .with_ymd_and_hms(2025, 8, 29, 9, 0, 0)
            .single()
            .expect("valid local time");
        let url = build_event_url(&sample_task(), start).expect("build url");

        let query = query_map(&url);
        assert_eq!(
            query.get("dates").map(String::as_str),
            Some("20250829T060000Z/20250829T070000Z")
        );
    }
}
