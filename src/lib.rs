pub mod api;
pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod guard;
pub mod models;
pub mod routes;
pub mod state;
pub mod stores;
