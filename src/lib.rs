pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod snapshot;
pub mod state;
pub mod storage;
pub mod types;

#[cfg(test)]
pub mod testing;
