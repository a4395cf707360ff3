//! Application configuration loaded from environment variables.

use std::env;

use scribe_core::query::DEFAULT_PAGE_SIZE;
use scribe_core::services::BlogSettings;
use scribe_infra::database::{DatabaseConfig, SecondaryDbConfig};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub blog: BlogSettings,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|main_url| DatabaseConfig {
            main_url,
            main_max_connections: env_parse("DB_MAX_CONNECTIONS").unwrap_or(100),
            main_min_connections: env_parse("DB_MIN_CONNECTIONS").unwrap_or(10),
            secondary_databases: Self::parse_secondary_databases(env::vars()),
        });

        let blog = BlogSettings {
            page_size: env_parse("PAGE_SIZE")
                .filter(|size: &u64| *size > 0)
                .unwrap_or(DEFAULT_PAGE_SIZE),
            ..BlogSettings::default()
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env_parse("PORT").unwrap_or(8080),
            database,
            blog,
        }
    }

    /// Parse secondary databases.
    /// Format: SECONDARY_DB_<NAME>=<URL>,<MAX_CONNECTIONS>
    /// Example: SECONDARY_DB_REPORTING=postgres://...,20
    fn parse_secondary_databases(
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Vec<SecondaryDbConfig> {
        let mut secondary: Vec<SecondaryDbConfig> = vars
            .into_iter()
            .filter_map(|(key, value)| {
                let name = key.strip_prefix("SECONDARY_DB_")?.to_lowercase();
                let (url, max) = match value.split_once(',') {
                    Some((url, max)) => (url, max.trim().parse().ok()),
                    None => (value.as_str(), None),
                };
                if url.is_empty() {
                    return None;
                }
                Some(SecondaryDbConfig {
                    name,
                    url: url.to_string(),
                    max_connections: max.unwrap_or(20),
                })
            })
            .collect();
        secondary.sort_by(|a, b| a.name.cmp(&b.name));
        secondary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn secondary_databases_are_parsed_from_prefixed_vars() {
        let parsed = AppConfig::parse_secondary_databases(vars(&[
            ("SECONDARY_DB_REPORTING", "postgres://replica/blog,5"),
            ("SECONDARY_DB_ARCHIVE", "postgres://archive/blog"),
            ("DATABASE_URL", "postgres://main/blog"),
            ("SECONDARY_DB_EMPTY", ""),
        ]));

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].name, "archive");
        assert_eq!(parsed[0].max_connections, 20);
        assert_eq!(parsed[1].name, "reporting");
        assert_eq!(parsed[1].url, "postgres://replica/blog");
        assert_eq!(parsed[1].max_connections, 5);
    }
}
