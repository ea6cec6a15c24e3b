pub mod cli;
pub mod endpoints;
pub mod error;
pub mod handler;
pub mod metadata;
pub mod routes;
pub mod server;
pub mod types;
