pub mod catalog;
pub mod registry;
pub mod table_spec;
