use crate::infrastructure::error::InfraError;
use std::sync::Mutex;

/// Delivery channel for reminder notifications. Permission is asked once per
/// scheduling attempt; a denied grant leaves the reminder unset.
pub trait Notifier: Send + Sync {
    fn request_permission(&self) -> Result<bool, InfraError>;
    fn notify(&self, title: &str, body: &str) -> Result<(), InfraError>;
}

/// Writes notifications to the controlling terminal. The permission grant is
/// the `notificationsEnabled` consent flag from the app config.
#[derive(Debug, Clone)]
pub struct TerminalNotifier {
    enabled: bool,
}

impl TerminalNotifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Notifier for TerminalNotifier {
    fn request_permission(&self) -> Result<bool, InfraError> {
        Ok(self.enabled)
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), InfraError> {
        println!("\x07[{title}] {body}");
        Ok(())
    }
}

#[derive(Debug)]
pub struct InMemoryNotifier {
    granted: bool,
    delivered: Mutex<Vec<(String, String)>>,
}

impl InMemoryNotifier {
    pub fn new(granted: bool) -> Self {
        Self {
            granted,
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn delivered(&self) -> Vec<(String, String)> {
        self.delivered
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl Notifier for InMemoryNotifier {
    fn request_permission(&self) -> Result<bool, InfraError> {
        Ok(self.granted)
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), InfraError> {
        let mut guard = self.delivered.lock().map_err(|error| {
            InfraError::InvalidConfig(format!("in-memory notifier lock poisoned: {error}"))
        })?;
        guard.push((title.to_string(), body.to_string()));
        Ok(())
    }
}
