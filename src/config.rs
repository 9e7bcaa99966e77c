use serde::Deserialize;
use std::path::{Path, PathBuf};

/// How the database file at `database_path` is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseFormat {
    /// The links service's SQLite `data.db`.
    Sqlite,
    /// A native DuckDB database.
    DuckDb,
}

impl DatabaseFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "sqlite" => Some(Self::Sqlite),
            "duckdb" => Some(Self::DuckDb),
            _ => None,
        }
    }
}

/// Application configuration loaded from environment variables or TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database holding the `items` and `logs` tables.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_database_format")]
    pub database_format: DatabaseFormat,
    /// Seconds before a loaded snapshot is re-read. 0 = keep it until
    /// `POST /api/refresh`.
    #[serde(default)]
    pub snapshot_ttl_secs: u64,
    /// Aliases preselected in the per-alias usage chart.
    #[serde(default = "default_aliases")]
    pub default_aliases: Vec<String>,
    /// Dashboard origin for CORS restrictions on API routes.
    /// If not set, API routes allow any origin.
    #[serde(default)]
    pub dashboard_origin: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

fn default_database_path() -> PathBuf {
    PathBuf::from("pb_data/data.db")
}

const fn default_database_format() -> DatabaseFormat {
    DatabaseFormat::Sqlite
}

fn default_aliases() -> Vec<String> {
    vec!["g".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_path: default_database_path(),
            database_format: default_database_format(),
            snapshot_ttl_secs: 0,
            default_aliases: default_aliases(),
            dashboard_origin: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults.
    ///
    /// Environment variables override file values:
    /// - `LINKS_STATS_HOST` → host
    /// - `LINKS_STATS_PORT` → port
    /// - `LINKS_STATS_DATABASE` → database_path
    /// - `LINKS_STATS_DATABASE_FORMAT` → database_format (`sqlite` or `duckdb`)
    /// - `LINKS_STATS_SNAPSHOT_TTL` → snapshot_ttl_secs
    /// - `LINKS_STATS_DEFAULT_ALIASES` → default_aliases (comma-separated)
    /// - `LINKS_STATS_DASHBOARD_ORIGIN` → dashboard_origin
    pub fn load(config_path: Option<&Path>) -> Self {
        let mut config =
            config_path.map_or_else(Self::default, |path| match std::fs::read_to_string(path) {
                Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                    tracing::warn!("Failed to parse config file: {e}, using defaults");
                    Self::default()
                }),
                Err(e) => {
                    tracing::warn!("Failed to read config file: {e}, using defaults");
                    Self::default()
                }
            });

        // Environment variable overrides
        if let Ok(host) = std::env::var("LINKS_STATS_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("LINKS_STATS_PORT") {
            if let Ok(p) = port.parse() {
                config.port = p;
            }
        }
        if let Ok(path) = std::env::var("LINKS_STATS_DATABASE") {
            config.database_path = PathBuf::from(path);
        }
        if let Ok(val) = std::env::var("LINKS_STATS_DATABASE_FORMAT") {
            match DatabaseFormat::parse(&val) {
                Some(format) => config.database_format = format,
                None => tracing::warn!("Ignoring unknown LINKS_STATS_DATABASE_FORMAT: {val}"),
            }
        }
        if let Ok(val) = std::env::var("LINKS_STATS_SNAPSHOT_TTL") {
            if let Ok(t) = val.parse() {
                config.snapshot_ttl_secs = t;
            }
        }
        if let Ok(val) = std::env::var("LINKS_STATS_DEFAULT_ALIASES") {
            config.default_aliases = split_aliases(&val);
        }
        if let Ok(origin) = std::env::var("LINKS_STATS_DASHBOARD_ORIGIN") {
            config.dashboard_origin = Some(origin);
        }

        config
    }
}

/// Split a comma-separated alias list, dropping blanks.
pub fn split_aliases(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    /// Mutex to serialize tests that call `Config::load`, which reads
    /// environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.database_path, PathBuf::from("pb_data/data.db"));
        assert_eq!(config.database_format, DatabaseFormat::Sqlite);
        assert_eq!(config.snapshot_ttl_secs, 0);
        assert_eq!(config.default_aliases, vec!["g"]);
        assert!(config.dashboard_origin.is_none());
    }

    #[test]
    fn test_load_from_toml() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        write!(
            file,
            r#"
host = "127.0.0.1"
port = 9000
database_path = "/srv/links/stats.duckdb"
database_format = "duckdb"
snapshot_ttl_secs = 300
default_aliases = ["g", "yt"]
dashboard_origin = "https://stats.example.com"
"#
        )
        .unwrap();

        let config = Config::load(Some(&config_path));
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(
            config.database_path,
            PathBuf::from("/srv/links/stats.duckdb")
        );
        assert_eq!(config.database_format, DatabaseFormat::DuckDb);
        assert_eq!(config.snapshot_ttl_secs, 300);
        assert_eq!(config.default_aliases, vec!["g", "yt"]);
        assert_eq!(
            config.dashboard_origin.as_deref(),
            Some("https://stats.example.com")
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "port = 8123\n").unwrap();

        let config = Config::load(Some(&config_path));
        assert_eq!(config.port, 8123);
        assert_eq!(config.database_format, DatabaseFormat::Sqlite);
        assert_eq!(config.default_aliases, vec!["g"]);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        let config = Config::load(Some(Path::new("/nonexistent/config.toml")));
        assert_eq!(config.port, 8000);
    }

    #[test]
    fn test_load_no_path_uses_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        let config = Config::load(None);
        assert_eq!(config.port, 8000);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_env_var_overrides() {
        let _guard = ENV_LOCK.lock().unwrap();

        let orig_port = std::env::var("LINKS_STATS_PORT").ok();
        let orig_aliases = std::env::var("LINKS_STATS_DEFAULT_ALIASES").ok();

        std::env::set_var("LINKS_STATS_PORT", "3000");
        std::env::set_var("LINKS_STATS_DEFAULT_ALIASES", "g, yt,,gh");
        let config = Config::load(None);
        assert_eq!(config.port, 3000);
        assert_eq!(config.default_aliases, vec!["g", "yt", "gh"]);

        match orig_port {
            Some(v) => std::env::set_var("LINKS_STATS_PORT", v),
            None => std::env::remove_var("LINKS_STATS_PORT"),
        }
        match orig_aliases {
            Some(v) => std::env::set_var("LINKS_STATS_DEFAULT_ALIASES", v),
            None => std::env::remove_var("LINKS_STATS_DEFAULT_ALIASES"),
        }
    }

    #[test]
    fn test_invalid_toml_uses_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "this is not valid toml {{{").unwrap();

        let config = Config::load(Some(&config_path));
        assert_eq!(config.port, 8000);
    }

    #[test]
    fn test_database_format_parse() {
        assert_eq!(DatabaseFormat::parse("SQLite"), Some(DatabaseFormat::Sqlite));
        assert_eq!(DatabaseFormat::parse("duckdb"), Some(DatabaseFormat::DuckDb));
        assert_eq!(DatabaseFormat::parse("postgres"), None);
    }
}
