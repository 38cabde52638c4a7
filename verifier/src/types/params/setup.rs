use std::path::PathBuf;
use std::time::Duration;

use crate::cli::SetupCmd;

#[derive(Debug, Clone)]
pub struct SetupParams {
    pub tag: Option<String>,
    pub cache_dir: PathBuf,
    pub releases_url: String,
    pub http_timeout: Duration,
}

impl From<SetupCmd> for SetupParams {
    fn from(value: SetupCmd) -> Self {
        Self {
            tag: value.tag.filter(|tag| !tag.is_empty()),
            cache_dir: value.cache_dir,
            releases_url: value.releases_url.trim_end_matches('/').to_string(),
            http_timeout: Duration::from_secs(value.http_timeout),
        }
    }
}
