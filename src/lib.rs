pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod idea;
pub mod lifecycle;
pub mod mock;
pub mod prompt;
pub mod schema;
pub mod server;
pub mod service;
pub mod validation;
