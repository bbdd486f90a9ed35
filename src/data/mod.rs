//! Data layer module
//!
//! Entity shapes shared by the network client, the views and the
//! render projections. Nothing here is persisted.

mod models;

pub use models::*;
