pub mod compile;
pub mod plan;
pub mod selection;
pub mod validate;
