pub mod api;
pub mod client;
pub mod errors;
pub mod models;
pub mod providers;
pub mod settings;
pub mod state;
pub mod store;
pub mod streaming;
