use crate::error::Result;
use crate::storage::StoreSettings;
use config::{Config, ConfigError, Environment, File as ConfigFile, FileFormat, FileSourceFile};
use serde::Deserialize;
use std::path::Path;

const REDACTED: &str = "********";

/// Settings for every collection flow, read from an optional config file and
/// then from the process environment. Keys match the environment variable
/// names, lowercased.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub proteomics_account: String,
    pub proteomics_container: String,

    pub ngs_account: String,
    pub ngs_samples_container: String,
    pub ngs_nextseq_container: String,
    pub ngs_miseq_container: String,

    pub dwh_server_name: String,
    pub dwh_db_name: String,
    pub dwh_user_name: String,
    pub dwh_password: String,
    /// Complete connection string. Takes precedence over the `dwh_*` parts.
    pub database_url: Option<String>,

    pub storage_endpoint: Option<String>,
    pub storage_region: Option<String>,
}

/// Load `Config.toml` from the working directory if present, or the given
/// file, then overlay environment variables.
pub fn load_configuration(path: Option<&Path>) -> Result<AppConfig> {
    let file: ConfigFile<FileSourceFile, FileFormat> = match path {
        Some(path) => ConfigFile::from(path).required(true),
        None => ConfigFile::with_name("Config").required(false),
    };
    Ok(load(file, Environment::default())?)
}

fn load(
    file: ConfigFile<FileSourceFile, FileFormat>,
    environment: Environment,
) -> std::result::Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(file)
        .add_source(environment)
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

/// Return `value` unless it is blank, in which case report `key` as missing.
pub fn require<'a>(key: &str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(ConfigError::NotFound(key.to_uppercase()).into());
    }
    Ok(value)
}

impl AppConfig {
    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            endpoint: self.storage_endpoint.clone(),
            region: self.storage_region.clone(),
        }
    }

    /// Warehouse connection string as libpq key/value pairs.
    pub fn database_url(&self) -> Result<String> {
        if let Some(url) = self.database_url.as_deref().filter(|url| !url.trim().is_empty()) {
            return Ok(url.to_string());
        }

        let host = require("dwh_server_name", &self.dwh_server_name)?;
        let dbname = require("dwh_db_name", &self.dwh_db_name)?;
        let user = require("dwh_user_name", &self.dwh_user_name)?;
        let password = require("dwh_password", &self.dwh_password)?;

        Ok(format!(
            "host={} dbname={} user={} password={}",
            quote_conninfo(host),
            quote_conninfo(dbname),
            quote_conninfo(user),
            quote_conninfo(password)
        ))
    }

    /// Copy safe to print: password and connection string masked.
    pub fn redacted(&self) -> AppConfig {
        let mut config = self.clone();
        if !config.dwh_password.is_empty() {
            config.dwh_password = REDACTED.to_string();
        }
        if config.database_url.is_some() {
            config.database_url = Some(REDACTED.to_string());
        }
        config
    }
}

fn quote_conninfo(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}
