use std::path::PathBuf;
use std::time::Duration;

use crate::cli::chain::ChainCliArgs;

#[derive(Debug, Clone)]
pub struct ChainParams {
    pub chains_file: PathBuf,
    pub http_timeout: Duration,
}

impl From<ChainCliArgs> for ChainParams {
    fn from(value: ChainCliArgs) -> Self {
        Self { chains_file: value.chains_file, http_timeout: Duration::from_secs(value.http_timeout) }
    }
}
