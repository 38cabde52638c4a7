use std::path::PathBuf;

use clap::Args;

use crate::core::compiler::default_download_base;

/// Parameters of the local compiler cache and of compiler runs.
#[derive(Debug, Clone, Args)]
#[group()]
pub struct CompilerCliArgs {
    /// Directory holding one solc binary per version and the resolc binaries.
    #[arg(env = "VERIFIER_CACHE_DIR", long, default_value = "./static")]
    pub cache_dir: PathBuf,

    /// Prefix the solc version is appended to when downloading a binary.
    /// Defaults to the solc-bin distribution for the current OS.
    #[arg(env = "VERIFIER_SOLC_DOWNLOAD_BASE", long)]
    pub solc_download_base: Option<String>,

    /// Seconds a compiler run may take before it is killed.
    #[arg(env = "VERIFIER_COMPILE_TIMEOUT", long, default_value = "120")]
    pub compile_timeout: u64,
}

impl CompilerCliArgs {
    pub fn download_base(&self) -> String {
        self.solc_download_base.clone().unwrap_or_else(|| default_download_base().to_string())
    }
}
