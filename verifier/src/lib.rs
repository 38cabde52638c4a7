/// Command line arguments of the service
pub mod cli;
/// Chain registry loading
pub mod config;
/// Compiler cache, recompilation and bytecode comparison
pub mod core;
pub mod error;
/// HTTP server and routes
pub mod server;
/// Verification flow tying the core modules together
pub mod service;
/// resolc installation
pub mod setup;
pub mod types;
pub mod utils;

#[cfg(test)]
mod tests;

pub use error::{VerifierError, VerifierResult};
