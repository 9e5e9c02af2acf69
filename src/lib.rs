pub mod catalog;
pub mod client;
pub mod config;
pub mod data_sources;
pub mod error;
pub mod models;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod secret;
pub mod state;

pub use provider::{AzdoProvider, PROVIDER_NAME};
