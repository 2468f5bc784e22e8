use crate::db::oracle::DEFAULT_FETCH_SIZE;
use crate::db::{connect::DEFAULT_PORT, ConnectParams};
use crate::error::{Result, RunError};
use crate::runner;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub log_file: Option<String>,
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    /// Name of an environment variable holding the password.
    #[serde(default)]
    pub password_env: Option<String>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_fetch_size")]
    pub fetch_size: u32,
}

// Hand-written so the password never reaches a log line.
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("password_env", &self.password_env)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("service_name", &self.service_name)
            .field("fetch_size", &self.fetch_size)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Replaces the built-in query sequence when non-empty.
    #[serde(default)]
    pub queries: Vec<String>,
}

fn default_username() -> String {
    "system".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_service_name() -> String {
    "XEPDB1".to_string()
}

fn default_fetch_size() -> u32 {
    DEFAULT_FETCH_SIZE
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: None,
            password_env: None,
            host: default_host(),
            port: default_port(),
            service_name: default_service_name(),
            fetch_size: default_fetch_size(),
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RunError::config(format!("cannot read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            RunError::config(format!("invalid config file {}: {}", path.display(), e))
        })
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| RunError::config(format!("invalid config: {}", e)))
    }
}

/// Values supplied on the command line or through `ORARUN_*` variables.
/// Anything set here wins over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub connect: Option<String>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub service_name: Option<String>,
    pub fetch_size: Option<u32>,
    pub queries: Vec<String>,
    pub verbose: bool,
    pub log_file: Option<String>,
}

/// Fully resolved settings for one run.
#[derive(Debug)]
pub struct Settings {
    pub params: ConnectParams,
    pub fetch_size: u32,
    pub queries: Vec<String>,
    pub logging: LoggingConfig,
}

impl Settings {
    pub fn resolve(config: Config, mut overrides: Overrides) -> Result<Self> {
        let db = config.database;

        let mut params = match overrides.connect.as_deref() {
            Some(connect) => ConnectParams::parse(connect)?,
            None => ConnectParams {
                username: db.username.clone(),
                password: match overrides.password.take() {
                    Some(password) => password,
                    None => resolve_password(&db)?,
                },
                host: db.host.clone(),
                port: db.port,
                service_name: db.service_name.clone(),
            },
        };
        if let Some(username) = overrides.username {
            params.username = username;
        }
        if let Some(password) = overrides.password {
            params.password = password;
        }
        if let Some(host) = overrides.host {
            params.host = host;
        }
        if let Some(port) = overrides.port {
            params.port = port;
        }
        if let Some(service_name) = overrides.service_name {
            params.service_name = service_name;
        }
        if params.password.expose_secret().is_empty() {
            return Err(RunError::config(
                "no password specified: use --password/ORARUN_PASSWORD, \
                 --connect/ORARUN_CONNECT, or [database] password/password_env",
            ));
        }

        let queries = if !overrides.queries.is_empty() {
            read_queries(&overrides.queries)?
        } else if !config.run.queries.is_empty() {
            read_queries(&config.run.queries)?
        } else {
            runner::default_queries()
        };

        let logging = LoggingConfig {
            log_file: overrides.log_file.or(config.logging.log_file),
            verbose: overrides.verbose || config.logging.verbose,
        };

        Ok(Self {
            params,
            fetch_size: overrides.fetch_size.unwrap_or(db.fetch_size),
            queries,
            logging,
        })
    }
}

/// Config-file password: `password_env` indirection first, then the literal.
/// Empty when neither is set; the command line may still supply one.
fn resolve_password(db: &DatabaseConfig) -> Result<SecretString> {
    if let Some(key) = db.password_env.as_deref() {
        match std::env::var(key) {
            Ok(val) if !val.is_empty() => return Ok(SecretString::from(val)),
            _ => {
                if db.password.is_none() {
                    return Err(RunError::config(format!(
                        "password_env '{}' is not set",
                        key
                    )));
                }
            }
        }
    }
    Ok(SecretString::from(db.password.clone().unwrap_or_default()))
}

fn read_queries(inputs: &[String]) -> Result<Vec<String>> {
    inputs.iter().map(|q| read_query_or_file(q)).collect()
}

/// Accepts either SQL text or the path of a file containing it.
pub fn read_query_or_file(input: &str) -> Result<String> {
    let path = Path::new(input);

    if path.is_file() {
        let content = fs::read_to_string(path)?;
        Ok(content.trim().trim_end_matches(';').trim_end().to_string())
    } else {
        Ok(input.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn with_password(pw: &str) -> Overrides {
        Overrides {
            password: Some(SecretString::from(pw.to_string())),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_match_local_xe_instance() {
        let settings = Settings::resolve(Config::default(), with_password("pw")).unwrap();
        assert_eq!(settings.params.username, "system");
        assert_eq!(settings.params.descriptor(), "//localhost:1521/XEPDB1");
        assert_eq!(settings.fetch_size, DEFAULT_FETCH_SIZE);
        assert_eq!(settings.queries, runner::default_queries());
        assert!(!settings.logging.verbose);
    }

    #[test]
    fn parses_full_config_file() {
        let toml = r#"
            [database]
            username = "hr"
            password = "hrpw"
            host = "db.internal"
            port = 1522
            service_name = "ORCLPDB1"
            fetch_size = 500

            [run]
            queries = ["select 1 from dual"]

            [logging]
            verbose = true
            log_file = "run.log"
        "#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(toml.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        let settings = Settings::resolve(config, Overrides::default()).unwrap();

        assert_eq!(
            settings.params.connect_string(true),
            "hr/hrpw@//db.internal:1522/ORCLPDB1"
        );
        assert_eq!(settings.fetch_size, 500);
        assert_eq!(settings.queries, vec!["select 1 from dual"]);
        assert!(settings.logging.verbose);
        assert_eq!(settings.logging.log_file.as_deref(), Some("run.log"));
    }

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config = Config::from_toml("[database]\nhost = \"db2\"\n").unwrap();
        assert_eq!(config.database.host, "db2");
        assert_eq!(config.database.port, 1521);
        assert_eq!(config.database.service_name, "XEPDB1");
        assert!(config.run.queries.is_empty());
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = Config::from_toml("[database\nhost = ").unwrap_err();
        assert!(matches!(err, RunError::Config { .. }));
    }

    #[test]
    fn missing_config_file_is_config_error() {
        let err = Config::from_file("/nonexistent/orarun.toml").unwrap_err();
        assert!(err.to_string().contains("cannot read config file"), "Got: {}", err);
    }

    #[test]
    fn overrides_win_over_config() {
        let config = Config::from_toml("[database]\nhost = \"db2\"\npassword = \"filepw\"\n").unwrap();
        let overrides = Overrides {
            host: Some("db3".to_string()),
            port: Some(1600),
            password: Some(SecretString::from("clipw".to_string())),
            fetch_size: Some(7),
            verbose: true,
            ..Default::default()
        };

        let settings = Settings::resolve(config, overrides).unwrap();

        assert_eq!(settings.params.host, "db3");
        assert_eq!(settings.params.port, 1600);
        assert_eq!(settings.params.password.expose_secret(), "clipw");
        assert_eq!(settings.fetch_size, 7);
        assert!(settings.logging.verbose);
    }

    #[test]
    fn connect_string_override_replaces_database_section() {
        let config = Config::from_toml("[database]\nhost = \"db2\"\n").unwrap();
        let overrides = Overrides {
            connect: Some("scott/tiger@//other:1530/SVC".to_string()),
            service_name: Some("SVC2".to_string()),
            ..Default::default()
        };

        let settings = Settings::resolve(config, overrides).unwrap();

        assert_eq!(
            settings.params.connect_string(true),
            "scott/tiger@//other:1530/SVC2"
        );
    }

    #[test]
    fn password_env_indirection_must_be_set() {
        let config = Config::from_toml(
            "[database]\npassword_env = \"ORARUN_TEST_SURELY_UNSET_PASSWORD_VAR\"\n",
        )
        .unwrap();
        let err = Settings::resolve(config, Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("is not set"), "Got: {}", err);
    }

    #[test]
    fn command_line_password_skips_password_env() {
        let config = Config::from_toml(
            "[database]\npassword_env = \"ORARUN_TEST_SURELY_UNSET_PASSWORD_VAR\"\n",
        )
        .unwrap();
        let settings = Settings::resolve(config, with_password("clipw")).unwrap();
        assert_eq!(settings.params.password.expose_secret(), "clipw");
    }

    #[test]
    fn password_env_indirection_supplies_password() {
        let key = "ORARUN_TEST_PASSWORD_ENV_RESOLVES";
        std::env::set_var(key, "from-env");
        let config = Config::from_toml(&format!(
            "[database]\npassword = \"filepw\"\npassword_env = \"{}\"\n",
            key
        ))
        .unwrap();

        let settings = Settings::resolve(config, Overrides::default());
        std::env::remove_var(key);

        assert_eq!(settings.unwrap().params.password.expose_secret(), "from-env");
    }

    #[test]
    fn missing_password_is_rejected() {
        let err = Settings::resolve(Config::default(), Overrides::default())
            .unwrap_err()
            .to_string();
        assert!(err.contains("no password specified"), "Got: {}", err);
        assert!(err.contains("--connect"), "Got: {}", err);
        assert!(err.contains("password_env"), "Got: {}", err);
    }

    #[test]
    fn config_file_queries_read_sql_files() {
        let mut sql = NamedTempFile::new().unwrap();
        writeln!(sql, "select first_name from employees;").unwrap();
        let config = Config::from_toml(&format!(
            "[database]\npassword = \"pw\"\n[run]\nqueries = [{:?}, \"select 1 from dual\"]\n",
            sql.path().display().to_string()
        ))
        .unwrap();

        let settings = Settings::resolve(config, Overrides::default()).unwrap();

        assert_eq!(
            settings.queries,
            vec!["select first_name from employees", "select 1 from dual"]
        );
    }

    #[test]
    fn debug_output_hides_password() {
        let config = Config::from_toml("[database]\npassword = \"hunter2\"\n").unwrap();
        let shown = format!("{:?}", config);
        assert!(!shown.contains("hunter2"), "Got: {}", shown);
    }

    #[test]
    fn query_override_reads_sql_files() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "select count(*) from employees;").unwrap();
        let overrides = Overrides {
            queries: vec![
                file.path().display().to_string(),
                "select 1 from dual".to_string(),
            ],
            ..with_password("pw")
        };

        let settings = Settings::resolve(Config::default(), overrides).unwrap();

        assert_eq!(
            settings.queries,
            vec!["select count(*) from employees", "select 1 from dual"]
        );
    }
}
