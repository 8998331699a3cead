use serde::Deserialize;

#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum BackupStoreType {
    Filesystem { base_dir: String, filename: String },
    Noop,
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct ControlPlane {
    pub url: String,
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct BackupStore {
    #[serde(flatten)]
    pub r#type: BackupStoreType,
}

#[derive(Deserialize, Debug)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

fn default_sync_interval() -> u64 {
    30
}

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default)]
    pub listener: Listener,
    pub control_plane: ControlPlane,
    pub backup_store: BackupStore,
    /// Seconds between periodic cohort table reloads.
    #[serde(default = "default_sync_interval")]
    pub sync_interval_secs: u64,
}
