pub mod chains;

pub use chains::{ChainInfo, ChainRegistry};
