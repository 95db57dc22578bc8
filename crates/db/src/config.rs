use std::fmt;

use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

/// Maximum length of a device identifier (matches the `instance_id` column).
pub const MAX_DEVICE_ID_LEN: usize = 200;

fn default_port() -> u16 {
    5432
}

fn default_max_connections() -> u32 {
    5
}

/// The `dbconfig` section of the configuration file.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DbConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub dbname: String,
    pub username: String,
    pub password: String,
    /// Identifies this device; every stored measurement is tagged with it
    /// and list queries are scoped to it.
    pub device_id: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl DbConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.dbname)
            .username(&self.username)
            .password(&self.password)
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("device_id", &self.device_id)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}
