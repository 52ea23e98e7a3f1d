pub mod app;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod extract;
pub mod handlers;
pub mod infra;
pub mod logging;
pub mod models;
pub mod ports;
pub mod validate;

pub use handlers::router;
