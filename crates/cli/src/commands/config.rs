use serde::Serialize;

use vouchery_core::config::{AppConfig, LogFormat};

#[derive(Debug, Serialize)]
struct ConfigView {
    command: &'static str,
    status: &'static str,
    database: DatabaseView,
    logging: LoggingView,
}

#[derive(Debug, Serialize)]
struct DatabaseView {
    url: String,
    max_connections: u32,
    timeout_secs: u64,
}

#[derive(Debug, Serialize)]
struct LoggingView {
    level: String,
    format: LogFormat,
}

pub fn run(config: &AppConfig) -> String {
    let view = ConfigView {
        command: "config",
        status: "ok",
        database: DatabaseView {
            url: config.database.url.clone(),
            max_connections: config.database.max_connections,
            timeout_secs: config.database.timeout_secs,
        },
        logging: LoggingView {
            level: config.logging.level.clone(),
            format: config.logging.format,
        },
    };

    serde_json::to_string_pretty(&view).unwrap_or_else(|error| {
        format!("{{\"command\":\"config\",\"status\":\"error\",\"message\":\"{error}\"}}")
    })
}

#[cfg(test)]
mod tests {
    use vouchery_core::config::AppConfig;

    #[test]
    fn config_view_includes_database_and_logging_sections() {
        let output = super::run(&AppConfig::default());

        assert!(output.contains("\"database\""));
        assert!(output.contains("sqlite://vouchery.db"));
        assert!(output.contains("\"logging\""));
    }
}
