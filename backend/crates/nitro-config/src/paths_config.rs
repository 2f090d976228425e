use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Where downloaded model files live (defaults to the platform data dir)
    pub user_data_dir: Option<String>,
}
