pub mod dialect;
pub mod eval;
pub mod params;
pub mod render;
