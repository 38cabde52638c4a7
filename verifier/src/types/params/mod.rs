pub mod chain;
pub mod compiler;
pub mod service;
pub mod setup;

pub use chain::ChainParams;
pub use compiler::CompilerParams;
pub use service::ServerParams;
pub use setup::SetupParams;
