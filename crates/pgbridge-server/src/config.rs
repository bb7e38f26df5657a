//! Server configuration.
//!
//! Read from the TOML file named by `PGBRIDGE_CONFIG` when set, otherwise from the
//! environment:
//!
//! | variable | default |
//! |---|---|
//! | `POSTGRES_DSN` | required |
//! | `PGBRIDGE_HOST` | `0.0.0.0` |
//! | `PGBRIDGE_PORT` | `8000` |
//! | `PGBRIDGE_POOL_MAX_SIZE` | `16` |
//!
//! String values in the file may reference the environment as `${VAR}`:
//!
//! ```toml
//! [server]
//! port = 8080
//!
//! [database]
//! url = "${POSTGRES_DSN}"
//! pool_max_size = 8
//! ```

use serde::Deserialize;
use std::path::Path;

pub const CONFIG_PATH_VAR: &str = "PGBRIDGE_CONFIG";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_POOL_MAX_SIZE: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub pool_max_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    server: ServerSection,
    database: DatabaseSection,
}

#[derive(Debug, Clone, Deserialize)]
struct ServerSection {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    url: String,
    #[serde(default = "default_pool_max_size")]
    pool_max_size: usize,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_pool_max_size() -> usize {
    DEFAULT_POOL_MAX_SIZE
}

impl ServerConfig {
    /// Load from `PGBRIDGE_CONFIG` if set, otherwise from the environment.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::from_file(Path::new(&path)),
            Err(_) => Self::from_env(),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("failed to read config file {}: {e}", path.display())
        })?;
        Self::from_toml(&raw, |key| std::env::var(key).ok()).map_err(|e| {
            anyhow::anyhow!("failed to load config file {}: {e}", path.display())
        })
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_toml(raw: &str, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let file: ConfigFile = toml::from_str(raw)?;
        let config = Self {
            host: expand_env_vars(&file.server.host, &lookup)?,
            port: file.server.port,
            database_url: expand_env_vars(&file.database.url, &lookup)?,
            pool_max_size: file.database.pool_max_size,
        };
        config.validate()?;
        Ok(config)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("POSTGRES_DSN")
            .ok_or_else(|| anyhow::anyhow!("the environment variable 'POSTGRES_DSN' must be set"))?;

        let port = match lookup("PGBRIDGE_PORT") {
            Some(v) => v
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid PGBRIDGE_PORT '{v}': {e}"))?,
            None => DEFAULT_PORT,
        };
        let pool_max_size = match lookup("PGBRIDGE_POOL_MAX_SIZE") {
            Some(v) => v
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid PGBRIDGE_POOL_MAX_SIZE '{v}': {e}"))?,
            None => DEFAULT_POOL_MAX_SIZE,
        };

        let config = Self {
            host: lookup("PGBRIDGE_HOST").unwrap_or_else(default_host),
            port,
            database_url,
            pool_max_size,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.trim().is_empty() {
            anyhow::bail!("database url must not be empty");
        }
        if self.pool_max_size == 0 {
            anyhow::bail!("pool_max_size must be at least 1");
        }
        Ok(())
    }

    /// `host:port` for binding the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn expand_env_vars(
    input: &str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut key = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                anyhow::bail!("unterminated env var reference: ${{{key}}}");
            }
            if key.is_empty() {
                anyhow::bail!("invalid env var reference: ${{}}");
            }

            let v = lookup(&key)
                .ok_or_else(|| anyhow::anyhow!("missing env var for config expansion: {key}"))?;
            out.push_str(&v);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_defaults() {
        let config = ServerConfig::from_lookup(env(&[("POSTGRES_DSN", "postgres://localhost/db")]))
            .unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.pool_max_size, 16);
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
    }

    #[test]
    fn env_overrides() {
        let config = ServerConfig::from_lookup(env(&[
            ("POSTGRES_DSN", "postgres://localhost/db"),
            ("PGBRIDGE_HOST", "127.0.0.1"),
            ("PGBRIDGE_PORT", "9000"),
            ("PGBRIDGE_POOL_MAX_SIZE", "4"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
        assert_eq!(config.pool_max_size, 4);
    }

    #[test]
    fn env_requires_dsn() {
        let err = ServerConfig::from_lookup(env(&[])).unwrap_err();
        assert!(err.to_string().contains("POSTGRES_DSN"));
    }

    #[test]
    fn env_rejects_bad_numbers() {
        assert!(
            ServerConfig::from_lookup(env(&[
                ("POSTGRES_DSN", "postgres://localhost/db"),
                ("PGBRIDGE_PORT", "eighty"),
            ]))
            .is_err()
        );
        assert!(
            ServerConfig::from_lookup(env(&[
                ("POSTGRES_DSN", "postgres://localhost/db"),
                ("PGBRIDGE_POOL_MAX_SIZE", "0"),
            ]))
            .is_err()
        );
    }

    #[test]
    fn toml_with_expansion() {
        let raw = r#"
            [server]
            port = 8080

            [database]
            url = "postgres://${DB_USER}@localhost/app"
        "#;
        let config = ServerConfig::from_toml(raw, env(&[("DB_USER", "svc")])).unwrap();
        assert_eq!(config.database_url, "postgres://svc@localhost/app");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.pool_max_size, 16);
    }

    #[test]
    fn toml_missing_variable_is_an_error() {
        let raw = r#"
            [database]
            url = "${NOPE}"
        "#;
        let err = ServerConfig::from_toml(raw, env(&[])).unwrap_err();
        assert!(err.to_string().contains("NOPE"));
    }

    #[test]
    fn expansion_rejects_unterminated_reference() {
        assert!(expand_env_vars("${OPEN", &env(&[])).is_err());
        assert!(expand_env_vars("${}", &env(&[])).is_err());
        assert_eq!(expand_env_vars("plain $ text", &env(&[])).unwrap(), "plain $ text");
    }
}
