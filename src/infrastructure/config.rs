use crate::infrastructure::error::InfraError;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::fs;
use std::path::Path;

const APP_JSON: &str = "app.json";
const DEFAULT_TIMEZONE: &str = "Asia/Riyadh";
const DEFAULT_REMINDER_DELAY_SECONDS: u64 = 3600;

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    let path = config_dir.join(APP_JSON);
    if !path.exists() {
        let defaults = serde_json::json!({
            "schema": 1,
            "appName": "BrainWeek",
            "timezone": DEFAULT_TIMEZONE,
            "referenceDate": null,
            "notificationsEnabled": true,
            "reminderDelaySeconds": DEFAULT_REMINDER_DELAY_SECONDS,
        });
        let formatted = serde_json::to_string_pretty(&defaults)?;
        fs::write(path, format!("{formatted}\n"))?;
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != 1 {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

fn read_app_config(config_dir: &Path) -> Result<serde_json::Value, InfraError> {
    read_config(&config_dir.join(APP_JSON))
}

pub fn read_app_name(config_dir: &Path) -> Result<String, InfraError> {
    let app = read_app_config(config_dir)?;
    let name = app
        .get("appName")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("BrainWeek");
    Ok(name.to_string())
}

pub fn read_timezone(config_dir: &Path) -> Result<Tz, InfraError> {
    let app = read_app_config(config_dir)?;
    let name = app
        .get("timezone")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_TIMEZONE)
        .to_string();
    name.parse::<Tz>()
        .map_err(|_| InfraError::InvalidConfig(format!("unknown timezone: {name}")))
}

/// Optional pinned "today" for reproducible scheduling. Absent or null means
/// wall-clock time.
pub fn read_reference_instant(config_dir: &Path) -> Result<Option<DateTime<Utc>>, InfraError> {
    let app = read_app_config(config_dir)?;
    let Some(raw) = app
        .get("referenceDate")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
    else {
        return Ok(None);
    };

    let parsed = DateTime::parse_from_rfc3339(raw).map_err(|error| {
        InfraError::InvalidConfig(format!("invalid referenceDate '{raw}': {error}"))
    })?;
    Ok(Some(parsed.with_timezone(&Utc)))
}

pub fn read_notifications_enabled(config_dir: &Path) -> Result<bool, InfraError> {
    let app = read_app_config(config_dir)?;
    Ok(app
        .get("notificationsEnabled")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(true))
}

pub fn read_reminder_delay_seconds(config_dir: &Path) -> Result<u64, InfraError> {
    let app = read_app_config(config_dir)?;
    Ok(app
        .get("reminderDelaySeconds")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(DEFAULT_REMINDER_DELAY_SECONDS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_TEMP_DIR: AtomicUsize = AtomicUsize::new(0);

    struct TempConfigDir {
        path: PathBuf,
    }

    impl TempConfigDir {
        fn new() -> Self {
            let sequence = NEXT_TEMP_DIR.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!(
                "brainweek-config-tests-{}-{}",
                std::process::id(),
                sequence
            ));
            fs::create_dir_all(&path).expect("create temp config dir");
            Self { path }
        }
    }

    impl Drop for TempConfigDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    #[test]
    fn defaults_are_created_and_readable() {
        let dir = TempConfigDir::new();
        ensure_default_configs(&dir.path).expect("write defaults");

        assert_eq!(read_app_name(&dir.path).expect("app name"), "BrainWeek");
        assert_eq!(
            read_timezone(&dir.path).expect("timezone"),
            chrono_tz::Asia::Riyadh
        );
        assert!(read_reference_instant(&dir.path).expect("reference").is_none());
        assert!(read_notifications_enabled(&dir.path).expect("notifications"));
        assert_eq!(
            read_reminder_delay_seconds(&dir.path).expect("delay"),
            DEFAULT_REMINDER_DELAY_SECONDS
        );
    }

    #[test]
    fn pinned_reference_date_is_parsed_as_utc() {
        let dir = TempConfigDir::new();
        let payload = serde_json::json!({
            "schema": 1,
            "timezone": "Asia/Riyadh",
            "referenceDate": "2025-08-27T12:00:00Z",
        });
        fs::write(
            dir.path.join(APP_JSON),
            serde_json::to_string_pretty(&payload).expect("serialize config"),
        )
        .expect("write config");

        let reference = read_reference_instant(&dir.path)
            .expect("read reference")
            .expect("pinned reference");
        assert_eq!(reference.to_rfc3339(), "2025-08-27T12:00:00+00:00");
    }

    #[test]
    fn unsupported_schema_is_rejected() {
        let dir = TempConfigDir::new();
        fs::write(dir.path.join(APP_JSON), r#"{"schema": 2}"#).expect("write config");
        assert!(matches!(
            read_app_name(&dir.path),
            Err(InfraError::InvalidConfig(_))
        ));
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let dir = TempConfigDir::new();
        fs::write(
            dir.path.join(APP_JSON),
            r#"{"schema": 1, "timezone": "Mars/Olympus"}"#,
        )
        .expect("write config");
        assert!(matches!(
            read_timezone(&dir.path),
            Err(InfraError::InvalidConfig(_))
        ));
    }
}
