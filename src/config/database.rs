use crate::{
    config::{DEFAULT_APP_NAME, Settings},
    error::{
        ConnectSnafu, ConnectTimeoutSnafu, MissingCredentialsSnafu, ParseSettingSnafu,
        StudentFormResult,
    },
};
use secrecy::{ExposeSecret, SecretString};
use snafu::{OptionExt, ResultExt};
use sqlx::{Connection, PgConnection, postgres::PgConnectOptions};
use std::{fmt, time::Duration};

pub const DEFAULT_DRIVER: &str = "ODBC Driver 17 for SQL Server";
pub const DEFAULT_SERVER: &str = "localhost";
pub const DEFAULT_DATABASE: &str = "Students";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 15;

#[derive(Clone, Debug)]
pub enum AuthMode {
    /// Log in as the ambient identity of the host process.
    Trusted,
    Credentialed {
        username: String,
        password: SecretString,
    },
}

impl AuthMode {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Trusted => "Windows Authentication",
            Self::Credentialed { .. } => "SQL Server Authentication",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    pub driver: String,
    pub server: String,
    pub port: Option<u16>,
    pub database: String,
    pub auth: AuthMode,
    pub application_name: String,
    pub connect_timeout: Duration,
}

impl ConnectionConfig {
    pub fn resolve(settings: &Settings) -> StudentFormResult<Self> {
        let trusted = settings
            .get_or("DB_TRUSTED_CONNECTION", "yes")
            .eq_ignore_ascii_case("yes");

        let auth = if trusted {
            AuthMode::Trusted
        } else {
            let username = settings.get_raw("DB_USERNAME").context(MissingCredentialsSnafu)?;
            let password = settings.get_raw("DB_PASSWORD").context(MissingCredentialsSnafu)?;
            AuthMode::Credentialed {
                username: username.to_string(),
                password: SecretString::from(password.to_string()),
            }
        };

        let (server, port) = split_server(settings.get_or("DB_SERVER", DEFAULT_SERVER))?;

        Ok(Self {
            driver: settings.get_or("DB_DRIVER", DEFAULT_DRIVER).to_string(),
            server: server.to_string(),
            port,
            database: settings.get_or("DB_NAME", DEFAULT_DATABASE).to_string(),
            auth,
            application_name: settings.get_or("APP_NAME", DEFAULT_APP_NAME).to_string(),
            connect_timeout: Duration::from_secs(
                settings.get_parsed("DB_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
            ),
        })
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        let mut options = PgConnectOptions::new()
            .host(&self.server)
            .database(&self.database)
            .application_name(&self.application_name);

        if let Some(port) = self.port {
            options = options.port(port);
        }

        //anything not set here falls back to libpq's `PG*` variables, so under trusted auth
        //`PGUSER` (or the OS account) is the login and `PGPASSWORD`/`.pgpass` are still honoured
        if let AuthMode::Credentialed { username, password } = &self.auth {
            options = options
                .username(username)
                .password(password.expose_secret());
        }

        options
    }

    /// Opens a single connection, bounded by the configured connect timeout.
    ///
    /// The connection closes when dropped, so every exit path of the caller releases it.
    pub async fn connect(&self) -> StudentFormResult<PgConnection> {
        let options = self.connect_options();
        debug!(server = %self.server, database = %self.database, "Opening database connection");

        tokio::time::timeout(self.connect_timeout, PgConnection::connect_with(&options))
            .await
            .map_err(|_elapsed| {
                ConnectTimeoutSnafu {
                    timeout: self.connect_timeout,
                }
                .build()
            })?
            .context(ConnectSnafu)
    }
}

///accepts `host`, `host:port`, `[v6]:port` or the `host,port` form sql server tooling uses;
///anything else with more than one `:` is a bare ipv6 address
fn split_server(server: &str) -> StudentFormResult<(&str, Option<u16>)> {
    let parse_port = |port: &str| -> StudentFormResult<u16> {
        port.trim().parse().context(ParseSettingSnafu {
            name: "DB_SERVER",
            value: server,
        })
    };

    if let Some(bracketed) = server.strip_prefix('[') {
        let Some((host, rest)) = bracketed.split_once(']') else {
            return Ok((server, None));
        };
        return match rest.strip_prefix([':', ',']) {
            Some(port) => Ok((host, Some(parse_port(port)?))),
            None if rest.trim().is_empty() => Ok((host, None)),
            None => parse_port(rest).map(|port| (host, Some(port))),
        };
    }

    if let Some((host, port)) = server.rsplit_once(',') {
        return Ok((host.trim(), Some(parse_port(port)?)));
    }

    match server.split_once(':') {
        Some((host, port)) if !port.contains(':') => Ok((host.trim(), Some(parse_port(port)?))),
        _ => Ok((server, None)),
    }
}

/// Connection summary without the password, safe for logs and console output.
impl fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Server: {}", self.server)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        writeln!(f)?;
        writeln!(f, "Database: {}", self.database)?;
        writeln!(f, "Driver: {}", self.driver)?;
        write!(f, "Authentication: {}", self.auth.label())?;
        if let AuthMode::Credentialed { username, .. } = &self.auth {
            write!(f, " ({username})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, StudentFormError};

    #[test]
    fn defaults_apply_when_unset() {
        let config = ConnectionConfig::resolve(&Settings::default()).unwrap();
        assert_eq!(config.driver, DEFAULT_DRIVER);
        assert_eq!(config.server, "localhost");
        assert_eq!(config.port, None);
        assert_eq!(config.database, "Students");
        assert!(matches!(config.auth, AuthMode::Trusted));
        assert_eq!(config.application_name, DEFAULT_APP_NAME);
        assert_eq!(config.connect_timeout, Duration::from_secs(15));
    }

    #[test]
    fn trusted_flag_is_case_insensitive() {
        let config =
            ConnectionConfig::resolve(&Settings::from_iter([("DB_TRUSTED_CONNECTION", "YES")]))
                .unwrap();
        assert!(matches!(config.auth, AuthMode::Trusted));
    }

    #[test]
    fn credentialed_without_credentials_fails() {
        for settings in [
            Settings::from_iter([("DB_TRUSTED_CONNECTION", "no")]),
            Settings::from_iter([("DB_TRUSTED_CONNECTION", "no"), ("DB_USERNAME", "sa")]),
            Settings::from_iter([("DB_TRUSTED_CONNECTION", "no"), ("DB_PASSWORD", "hunter2")]),
            Settings::from_iter([
                ("DB_TRUSTED_CONNECTION", "false"),
                ("DB_USERNAME", "sa"),
                ("DB_PASSWORD", ""),
            ]),
        ] {
            let Err(e) = ConnectionConfig::resolve(&settings) else {
                panic!("resolution should fail for {settings:?}");
            };
            assert!(matches!(e, StudentFormError::MissingCredentials));
            assert_eq!(e.kind(), ErrorKind::Configuration);
        }
    }

    #[test]
    fn credentialed_with_credentials_resolves() {
        let config = ConnectionConfig::resolve(&Settings::from_iter([
            ("DB_TRUSTED_CONNECTION", "no"),
            ("DB_USERNAME", "registrar"),
            ("DB_PASSWORD", "hunter2"),
            ("DB_SERVER", "db.school.internal,5433"),
            ("DB_NAME", "Records"),
        ]))
        .unwrap();

        let AuthMode::Credentialed { username, password } = &config.auth else {
            panic!("expected credentialed auth");
        };
        assert_eq!(username, "registrar");
        assert_eq!(password.expose_secret(), "hunter2");
        assert_eq!(config.server, "db.school.internal");
        assert_eq!(config.port, Some(5433));

        let options = config.connect_options();
        assert_eq!(options.get_host(), "db.school.internal");
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_username(), "registrar");
        assert_eq!(options.get_database(), Some("Records"));
    }

    #[test]
    fn summary_never_shows_password() {
        let config = ConnectionConfig::resolve(&Settings::from_iter([
            ("DB_TRUSTED_CONNECTION", "no"),
            ("DB_USERNAME", "registrar"),
            ("DB_PASSWORD", "hunter2"),
        ]))
        .unwrap();

        let summary = config.to_string();
        assert!(summary.contains("SQL Server Authentication (registrar)"));
        assert!(!summary.contains("hunter2"));
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn bad_server_port_and_timeout_fail() {
        for server in ["localhost:abc", "[::1]:abc", "db,"] {
            let e = ConnectionConfig::resolve(&Settings::from_iter([("DB_SERVER", server)]))
                .unwrap_err();
            assert!(matches!(e, StudentFormError::ParseSetting { name: "DB_SERVER", .. }));
        }

        let e = ConnectionConfig::resolve(&Settings::from_iter([(
            "DB_CONNECT_TIMEOUT_SECS",
            "soon",
        )]))
        .unwrap_err();
        assert!(matches!(
            e,
            StudentFormError::ParseSetting {
                name: "DB_CONNECT_TIMEOUT_SECS",
                ..
            }
        ));
    }

    #[test]
    fn credentials_keep_surrounding_whitespace() {
        let config = ConnectionConfig::resolve(&Settings::from_iter([
            ("DB_TRUSTED_CONNECTION", "no"),
            ("DB_USERNAME", "registrar"),
            ("DB_PASSWORD", " s3cret "),
        ]))
        .unwrap();

        let AuthMode::Credentialed { password, .. } = &config.auth else {
            panic!("expected credentialed auth");
        };
        assert_eq!(password.expose_secret(), " s3cret ");
    }

    #[test]
    fn server_forms_split_into_host_and_port() {
        for (server, host, port) in [
            ("localhost", "localhost", None),
            ("db.school.internal:5433", "db.school.internal", Some(5433)),
            ("db.school.internal,5433", "db.school.internal", Some(5433)),
            ("::1", "::1", None),
            ("fe80::1:2", "fe80::1:2", None),
            ("[::1]", "::1", None),
            ("[::1]:5433", "::1", Some(5433)),
            ("[::1],5433", "::1", Some(5433)),
        ] {
            let config =
                ConnectionConfig::resolve(&Settings::from_iter([("DB_SERVER", server)])).unwrap();
            assert_eq!(config.server, host, "host of {server:?}");
            assert_eq!(config.port, port, "port of {server:?}");
        }
    }

    #[test]
    fn configured_server_wins_under_trusted_auth() {
        let config = ConnectionConfig::resolve(&Settings::from_iter([("DB_SERVER", "[::1]:5433")]))
            .unwrap();
        let options = config.connect_options();
        assert_eq!(options.get_host(), "::1");
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_database(), Some("Students"));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_connection_error() {
        let config = ConnectionConfig::resolve(&Settings::from_iter([
            ("DB_SERVER", "127.0.0.1:1"),
            ("DB_CONNECT_TIMEOUT_SECS", "2"),
        ]))
        .unwrap();

        let e = config.connect().await.unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Connection);
    }
}
