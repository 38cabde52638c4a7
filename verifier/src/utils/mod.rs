pub mod hex;
pub mod logging;
