use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub sync: SyncSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    /// Directory for the local layout store
    pub data_dir: PathBuf,
    /// File holding server-side dashboards
    pub dashboards_file: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncSettings {
    pub remote_enabled: bool,
    pub remote_delay_ms: u64,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

impl SyncSettings {
    pub fn remote_delay(&self) -> Duration {
        Duration::from_millis(self.remote_delay_ms)
    }
}

/// Defaults, then `config/app.toml` if present, then `TRACKER__SECTION__KEY` environment variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = base_builder()?
        .add_source(config::File::with_name("config/app").required(false))
        .add_source(
            config::Environment::with_prefix("TRACKER")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

fn base_builder() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(config::Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("storage.data_dir", "data/local")?
        .set_default("storage.dashboards_file", "data/dashboards.json")?
        .set_default("sync.remote_enabled", false)?
        .set_default("sync.remote_delay_ms", 300)?)
}
