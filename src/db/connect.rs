use crate::error::{Result, RunError};
use secrecy::{ExposeSecret, SecretString};

pub const DEFAULT_PORT: u16 = 1521;

const REDACTED: &str = "[REDACTED]";

/// Everything needed to open one Oracle session.
///
/// The full connect string form is `<username>/<password>@//<host>:<port>/<service_name>`.
#[derive(Debug)]
pub struct ConnectParams {
    pub username: String,
    pub password: SecretString,
    pub host: String,
    pub port: u16,
    pub service_name: String,
}

impl ConnectParams {
    /// Connect descriptor handed to the driver: `//host:port/service_name`.
    pub fn descriptor(&self) -> String {
        format!("//{}:{}/{}", self.host, self.port, self.service_name)
    }

    /// Full EZConnect string. The password is masked unless `show_secrets`.
    pub fn connect_string(&self, show_secrets: bool) -> String {
        let password = if show_secrets {
            self.password.expose_secret()
        } else {
            REDACTED
        };
        format!("{}/{}@{}", self.username, password, self.descriptor())
    }

    /// Parse `user/password@//host[:port]/service`. The leading `//` is optional.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let (credentials, target) = input
            .rsplit_once('@')
            .ok_or_else(|| malformed(input, "missing '@'"))?;

        let (username, password) = credentials
            .split_once('/')
            .ok_or_else(|| malformed(input, "expected user/password before '@'"))?;
        if username.is_empty() {
            return Err(malformed(input, "empty username"));
        }
        if password.is_empty() {
            return Err(malformed(input, "empty password"));
        }

        let target = target.strip_prefix("//").unwrap_or(target);
        let (host_port, service_name) = target
            .split_once('/')
            .ok_or_else(|| malformed(input, "missing service name"))?;
        if service_name.is_empty() {
            return Err(malformed(input, "empty service name"));
        }

        let (host, port) = match split_port(host_port) {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| malformed(input, &format!("invalid port '{}'", port)))?;
                (host, port)
            }
            None => (host_port, DEFAULT_PORT),
        };
        if host.is_empty() {
            return Err(malformed(input, "empty host"));
        }

        Ok(Self {
            username: username.to_string(),
            password: SecretString::from(password.to_string()),
            host: host.to_string(),
            port,
            service_name: service_name.to_string(),
        })
    }
}

/// Split `host:port`. A bracketed IPv6 host only yields a port after its `]`.
fn split_port(host_port: &str) -> Option<(&str, &str)> {
    match host_port.rfind(']') {
        Some(end) if host_port.starts_with('[') => {
            let (host, rest) = host_port.split_at(end + 1);
            rest.strip_prefix(':').map(|port| (host, port))
        }
        _ => host_port.rsplit_once(':'),
    }
}

fn malformed(input: &str, reason: &str) -> RunError {
    // Never echo the password back.
    let shown = match input.rsplit_once('@') {
        Some((creds, target)) => match creds.split_once('/') {
            Some((user, _)) => format!("{}/{}@{}", user, REDACTED, target),
            None => format!("{}@{}", creds, target),
        },
        None => REDACTED.to_string(),
    };
    RunError::config(format!("malformed connect string '{}': {}", shown, reason))
}
