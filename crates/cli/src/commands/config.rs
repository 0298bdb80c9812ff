use haggle_core::config::{AppConfig, LoadOptions, LogFormat, VisionProvider};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ConfigReport {
    database: DatabaseReport,
    vision: VisionReport,
    logging: LoggingReport,
}

#[derive(Debug, Serialize)]
struct DatabaseReport {
    url: String,
    max_connections: u32,
    timeout_secs: u64,
}

#[derive(Debug, Serialize)]
struct VisionReport {
    provider: VisionProvider,
    model: String,
    base_url: Option<String>,
    api_key: &'static str,
    timeout_secs: u64,
    max_retries: u32,
}

#[derive(Debug, Serialize)]
struct LoggingReport {
    level: String,
    format: LogFormat,
}

/// Render the effective configuration with every secret redacted.
pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let report = ConfigReport {
        database: DatabaseReport {
            url: config.database.url.clone(),
            max_connections: config.database.max_connections,
            timeout_secs: config.database.timeout_secs,
        },
        vision: VisionReport {
            provider: config.vision.provider,
            model: config.vision.model.clone(),
            base_url: config.vision.base_url.clone(),
            api_key: if config.vision.api_key.is_some() { "<redacted>" } else { "<unset>" },
            timeout_secs: config.vision.timeout_secs,
            max_retries: config.vision.max_retries,
        },
        logging: LoggingReport {
            level: config.logging.level.clone(),
            format: config.logging.format,
        },
    };

    serde_json::to_string_pretty(&report)
        .unwrap_or_else(|error| format!("config report serialization failed: {error}"))
}
