use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Complete WebThing server configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebThingConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub actions: ActionsConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// What `submit` does when a bounded action queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FullQueuePolicy {
    /// Submitter waits for a free slot
    #[default]
    Block,
    /// Submitter gets `QueueFull` immediately
    Reject,
}

/// Action execution configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ActionsConfig {
    /// Number of worker tasks draining the queue
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// None or 0 means unbounded
    #[serde(default)]
    pub queue_capacity: Option<usize>,
    #[serde(default)]
    pub full_policy: FullQueuePolicy,
}

fn default_workers() -> usize {
    1
}

impl ActionsConfig {
    /// Queue capacity with `Some(0)` read as unbounded
    pub fn bounded_capacity(&self) -> Option<usize> {
        self.queue_capacity.filter(|n| *n > 0)
    }
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: None,
            full_policy: FullQueuePolicy::default(),
        }
    }
}

/// Notification delivery configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Outbox size of each WebSocket subscriber
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
    /// Raised events kept per event name
    #[serde(default = "default_event_history")]
    pub event_history: usize,
}

fn default_subscriber_buffer() -> usize {
    256
}

fn default_event_history() -> usize {
    10
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            subscriber_buffer: default_subscriber_buffer(),
            event_history: default_event_history(),
        }
    }
}

/// Thing lookup configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryConfig {
    /// In single-Thing mode, only the Thing's own name resolves
    #[serde(default)]
    pub strict_single: bool,
}

impl WebThingConfig {
    /// Apply `WEBTHING_*` environment overrides on top of file values
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("WEBTHING_BIND") {
            if !v.is_empty() {
                self.server.bind = v;
            }
        }
        if let Some(v) = lookup("WEBTHING_ACTION_WORKERS") {
            if let Ok(n) = v.parse::<usize>() {
                self.actions.workers = n;
            }
        }
        if let Some(v) = lookup("WEBTHING_QUEUE_CAPACITY") {
            if let Ok(n) = v.parse::<usize>() {
                self.actions.queue_capacity = Some(n);
            }
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> Result<WebThingConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: WebThingConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = WebThingConfig::default();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.actions.workers, 1);
        assert_eq!(config.actions.queue_capacity, None);
        assert_eq!(config.actions.full_policy, FullQueuePolicy::Block);
        assert_eq!(config.notify.subscriber_buffer, 256);
        assert_eq!(config.notify.event_history, 10);
        assert!(!config.registry.strict_single);
    }

    #[test]
    fn test_config_deserialization() {
        let toml = r#"
            [server]
            bind = "127.0.0.1:9000"

            [actions]
            workers = 4
            queue_capacity = 32
            full_policy = "reject"

            [notify]
            subscriber_buffer = 16
            event_history = 3

            [registry]
            strict_single = true
        "#;

        let config: WebThingConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.actions.workers, 4);
        assert_eq!(config.actions.queue_capacity, Some(32));
        assert_eq!(config.actions.full_policy, FullQueuePolicy::Reject);
        assert_eq!(config.notify.subscriber_buffer, 16);
        assert_eq!(config.notify.event_history, 3);
        assert!(config.registry.strict_single);
    }

    #[test]
    fn test_partial_config() {
        // Missing sections and keys use defaults
        let toml = r#"
            [actions]
            workers = 2
        "#;

        let config: WebThingConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.actions.workers, 2);
        assert_eq!(config.actions.queue_capacity, None);
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.notify.subscriber_buffer, 256);
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let toml = r#"
            [actions]
            full_policy = "drop"
        "#;

        assert!(toml::from_str::<WebThingConfig>(toml).is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("WEBTHING_BIND", "127.0.0.1:7000"),
            ("WEBTHING_ACTION_WORKERS", "3"),
            ("WEBTHING_QUEUE_CAPACITY", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = WebThingConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.bind, "127.0.0.1:7000");
        assert_eq!(config.actions.workers, 3);
        // Unparsable values are ignored
        assert_eq!(config.actions.queue_capacity, None);
    }

    #[test]
    fn test_zero_capacity_override_means_unbounded() {
        let mut config = WebThingConfig::default();
        config.actions.queue_capacity = Some(8);
        config.apply_overrides(|key| (key == "WEBTHING_QUEUE_CAPACITY").then(|| "0".to_string()));
        assert_eq!(config.actions.bounded_capacity(), None);
    }

    #[test]
    fn test_zero_capacity_in_file_means_unbounded() {
        let config: WebThingConfig = toml::from_str("[actions]\nqueue_capacity = 0\n").unwrap();
        assert_eq!(config.actions.bounded_capacity(), None);

        let config: WebThingConfig = toml::from_str("[actions]\nqueue_capacity = 4\n").unwrap();
        assert_eq!(config.actions.bounded_capacity(), Some(4));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nbind = \"127.0.0.1:8123\"").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8123");
        assert_eq!(config.actions.workers, 1);
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config("/nonexistent/webthing.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
