use std::path::PathBuf;
use std::time::Duration;

use crate::cli::compiler::CompilerCliArgs;

#[derive(Debug, Clone)]
pub struct CompilerParams {
    pub cache_dir: PathBuf,
    pub download_base: String,
    pub compile_timeout: Duration,
}

impl From<CompilerCliArgs> for CompilerParams {
    fn from(value: CompilerCliArgs) -> Self {
        Self {
            download_base: value.download_base(),
            cache_dir: value.cache_dir,
            compile_timeout: Duration::from_secs(value.compile_timeout),
        }
    }
}
