//! HTTP surface for the document portal: login, filter metadata and
//! multi-table search over the configured warehouse tables.

pub mod error;
pub mod pg;
pub mod routes;
pub mod state;
