pub mod api;
pub mod client;
pub mod config;
pub mod database;
pub mod middleware;
pub mod models;
pub mod relay;
pub mod seeds;
pub mod services;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
