pub mod utilities;

#[allow(unused_imports)]
pub use utilities::*;
