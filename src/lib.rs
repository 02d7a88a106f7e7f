pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod connector;
pub mod eip191;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;
pub mod types;
