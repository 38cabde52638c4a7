pub mod bytecode;
pub mod client;
pub mod compiler;
pub mod config;
