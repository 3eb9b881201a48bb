pub mod api;
pub mod carbon;
pub mod config;
pub mod dashboard;
pub mod database;
pub mod demo;
pub mod error;
pub mod ethereum;
pub mod indexer;
pub mod models;
