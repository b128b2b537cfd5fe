pub mod audio;
pub mod classifier;
pub mod config;
pub mod detection;
pub mod error;
pub mod handlers;
pub mod media;
pub mod routes;
pub mod state;
