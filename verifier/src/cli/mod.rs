use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use chain::ChainCliArgs;
pub use compiler::CompilerCliArgs;
pub use server::ServerCliArgs;

pub mod chain;
pub mod compiler;
pub mod server;

#[derive(Parser, Debug)]
#[command(
    name = "verifier",
    author,
    version,
    about = "Verifies that deployed contract bytecode was compiled from published sources",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the verification service
    Run {
        #[command(flatten)]
        run_command: Box<RunCmd>,
    },
    /// Install a resolc release into the compiler cache
    #[command(long_about = "Download a resolc release from GitHub into the compiler cache.\n\n\
        The binary is stored under its release tag and as the default resolc binary.\n\n\
        Examples:\n  \
        verifier setup\n  \
        verifier setup --tag v0.1.0-dev.12")]
    Setup {
        #[command(flatten)]
        setup_command: Box<SetupCmd>,
    },
}

#[derive(Parser, Debug, Clone)]
pub struct RunCmd {
    #[clap(flatten)]
    pub server_args: ServerCliArgs,

    #[clap(flatten)]
    pub compiler_args: CompilerCliArgs,

    #[clap(flatten)]
    pub chain_args: ChainCliArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct SetupCmd {
    /// Release tag to install, the latest release when omitted.
    #[arg(env = "VERIFIER_RESOLC_TAG", long)]
    pub tag: Option<String>,

    /// Directory the binary is installed into.
    #[arg(env = "VERIFIER_CACHE_DIR", long, default_value = "./static")]
    pub cache_dir: PathBuf,

    /// GitHub releases API of the resolc repository.
    #[arg(
        env = "VERIFIER_RESOLC_RELEASES_URL",
        long,
        default_value = "https://api.github.com/repos/paritytech/revive/releases"
    )]
    pub releases_url: String,

    /// Seconds an outgoing HTTP request may take.
    #[arg(env = "VERIFIER_HTTP_TIMEOUT", long, default_value = "300")]
    pub http_timeout: u64,
}
