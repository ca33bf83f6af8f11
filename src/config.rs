use crate::{
    config::database::ConnectionConfig,
    error::{ParseSettingSnafu, StudentFormResult},
};
use snafu::ResultExt;
use std::{collections::HashMap, ffi::OsString, sync::Arc};

pub mod database;

pub const DEFAULT_APP_NAME: &str = "Student Data Entry";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

/// Named settings, usually the process environment after `.env` has been loaded.
///
/// Empty values are treated the same as unset ones.
#[derive(Clone, Debug, Default)]
pub struct Settings(HashMap<String, String>);

impl Settings {
    pub fn from_env() -> Self {
        Self::from_os_vars(std::env::vars_os())
    }

    /// Keeps only the entries that are valid unicode, anything else can't be one of ours anyway.
    fn from_os_vars(vars: impl Iterator<Item = (OsString, OsString)>) -> Self {
        vars.filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_raw(name).map(str::trim).filter(|value| !value.is_empty())
    }

    /// Like [`Settings::get`] but without trimming, for values where whitespace is significant.
    pub fn get_raw(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    pub fn get_flag(&self, name: &str) -> bool {
        self.get(name).is_some_and(|value| {
            ["1", "true", "yes", "on"]
                .iter()
                .any(|truthy| value.eq_ignore_ascii_case(truthy))
        })
    }

    pub fn get_parsed<T>(&self, name: &'static str, default: T) -> StudentFormResult<T>
    where
        T: std::str::FromStr<Err = std::num::ParseIntError>,
    {
        match self.get(name) {
            None => Ok(default),
            Some(value) => value.parse().context(ParseSettingSnafu { name, value }),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Settings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[derive(Clone, Debug)]
pub struct RuntimeConfiguration {
    db_config: Arc<ConnectionConfig>,
    server_config: Arc<ServerConfig>,
}

impl RuntimeConfiguration {
    pub fn new(settings: &Settings) -> StudentFormResult<Self> {
        Ok(Self {
            db_config: Arc::new(ConnectionConfig::resolve(settings)?),
            server_config: Arc::new(ServerConfig::new(settings)?),
        })
    }

    pub fn db_config(&self) -> Arc<ConnectionConfig> {
        self.db_config.clone()
    }

    pub fn server_config(&self) -> Arc<ServerConfig> {
        self.server_config.clone()
    }

    pub fn app_name(&self) -> &str {
        &self.db_config.application_name
    }
}

#[derive(Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn new(settings: &Settings) -> StudentFormResult<Self> {
        Ok(Self {
            host: settings.get_or("HOST", DEFAULT_HOST).to_string(),
            port: settings.get_parsed("PORT", DEFAULT_PORT)?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
