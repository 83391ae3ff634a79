use anyhow::{bail, Context};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use lib_common::DEFAULT_BASE_URL;

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default)]
#[clap(about = "Mentions counter server: polls the item feed and pushes tallies to websocket clients.", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "MENTIONS_PORT", help = "Port to listen on for client connections.")]
    pub port: Option<u16>,

    #[clap(long, env = "MENTIONS_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "MENTIONS_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "MENTIONS_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "MENTIONS_FEED_BASE_URL", help = "Base URL of the item feed API.")]
    pub feed_base_url: Option<String>,

    #[clap(long, env = "MENTIONS_PHRASES", value_delimiter = ',', help = "Comma-separated mention phrases to count.")]
    pub mentions: Option<Vec<String>>,

    #[clap(long, env = "MENTIONS_START_FROM_DOC", help = "Document id to resume polling after; omit to start at the feed's current head.")]
    pub start_from_doc: Option<u64>,

    #[clap(long, env = "MENTIONS_POLL_INTERVAL_SECONDS", help = "Seconds between polls of the feed's latest id.")]
    pub poll_interval_seconds: Option<u64>,

    #[clap(long, env = "MENTIONS_WATCH_TYPES", value_delimiter = ',', help = "Feed item types eligible for counting.")]
    pub watch_types: Option<Vec<String>>,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            port: other.port.or(self.port),
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            feed_base_url: other.feed_base_url.or(self.feed_base_url),
            mentions: other.mentions.or(self.mentions),
            start_from_doc: other.start_from_doc.or(self.start_from_doc),
            poll_interval_seconds: other.poll_interval_seconds.or(self.poll_interval_seconds),
            watch_types: other.watch_types.or(self.watch_types),
        }
    }
}

/// Fully resolved configuration: every field present, sources merged.
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub feed_base_url: String,
    pub mentions: Vec<String>,
    pub start_from_doc: Option<u64>,
    pub poll_interval_seconds: u64,
    pub watch_types: Vec<String>,
}

pub fn load_config() -> anyhow::Result<Settings> {
    // 1. Load defaults
    let default_config = Config {
        port: Some(8000),
        log_dir: Some(PathBuf::from("./logs")),
        log_level: Some("info".to_string()),
        feed_base_url: Some(DEFAULT_BASE_URL.to_string()),
        poll_interval_seconds: Some(30),
        watch_types: Some(vec!["story".to_string()]),
        ..Default::default()
    };

    // 2. Load from config file (server_mentions.conf) if present.
    //    Allow overriding default config file path with CLI arg.
    let cli_args = Config::parse();

    let config_file_path = cli_args
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("server_mentions.conf"));

    let mut current_config = default_config;

    if config_file_path.exists() {
        let config_str = fs::read_to_string(&config_file_path)
            .with_context(|| format!("failed to read config file {}", config_file_path.display()))?;
        let file_config: Config = serde_json::from_str(&config_str)
            .with_context(|| format!("failed to parse config file {}", config_file_path.display()))?;
        current_config = current_config.merge(file_config);
    }

    // 3. Override with environment variables and CLI arguments
    //    clap::Parser automatically handles env vars and CLI args.
    current_config = current_config.merge(cli_args);

    resolve(current_config)
}

fn resolve(config: Config) -> anyhow::Result<Settings> {
    let mentions: Vec<String> = config
        .mentions
        .unwrap_or_default()
        .into_iter()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect();
    if mentions.is_empty() {
        bail!("no mention phrases configured; set them in the config file or via --mentions");
    }

    let watch_types: Vec<String> = config.watch_types.unwrap_or_default();
    if watch_types.is_empty() {
        bail!("watch-type allow-list is empty; nothing could ever qualify");
    }

    let poll_interval_seconds = config.poll_interval_seconds.unwrap_or(30);
    if poll_interval_seconds == 0 {
        bail!("poll interval must be at least one second");
    }

    Ok(Settings {
        port: config.port.unwrap_or(8000),
        log_dir: config.log_dir.unwrap_or_else(|| PathBuf::from("./logs")),
        log_level: config.log_level.unwrap_or_else(|| "info".to_string()),
        feed_base_url: config
            .feed_base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        mentions,
        start_from_doc: config.start_from_doc,
        poll_interval_seconds,
        watch_types,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            mentions: Some(vec!["Show HN".to_string()]),
            watch_types: Some(vec!["story".to_string()]),
            ..Default::default()
        }
    }

    #[test]
    fn resolve_applies_defaults() {
        let settings = resolve(base()).unwrap();
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.poll_interval_seconds, 30);
        assert_eq!(settings.feed_base_url, DEFAULT_BASE_URL);
        assert!(settings.start_from_doc.is_none());
    }

    #[test]
    fn resolve_requires_mentions() {
        let mut config = base();
        config.mentions = Some(vec!["  ".to_string()]);
        assert!(resolve(config).is_err());
        let mut config = base();
        config.mentions = None;
        assert!(resolve(config).is_err());
    }

    #[test]
    fn resolve_rejects_zero_interval() {
        let mut config = base();
        config.poll_interval_seconds = Some(0);
        assert!(resolve(config).is_err());
    }

    #[test]
    fn merge_prefers_the_override() {
        let file = Config {
            port: Some(9000),
            mentions: Some(vec!["rust".to_string()]),
            ..Default::default()
        };
        let cli = Config {
            port: Some(9100),
            ..Default::default()
        };
        let merged = file.merge(cli);
        assert_eq!(merged.port, Some(9100));
        assert_eq!(merged.mentions, Some(vec!["rust".to_string()]));
    }

    #[test]
    fn config_file_form_parses() {
        let config: Config = serde_json::from_str(
            r#"{"port":8100,"mentions":["Show HN","rust"],"startFromDoc":4200,"pollIntervalSeconds":10,"watchTypes":["story","job"]}"#,
        )
        .unwrap();
        let settings = resolve(config).unwrap();
        assert_eq!(settings.port, 8100);
        assert_eq!(settings.start_from_doc, Some(4200));
        assert_eq!(settings.mentions.len(), 2);
        assert_eq!(settings.watch_types, vec!["story", "job"]);
    }
}
