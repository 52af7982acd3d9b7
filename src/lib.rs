pub mod app;
pub mod config;
pub mod context;
pub mod db;
pub mod errors;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod utils;
