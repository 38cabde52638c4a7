pub mod params;
pub mod verification;
