pub mod analytics;
pub mod config;
pub mod content;
pub mod models;
pub mod redirect;
pub mod resolver;
pub mod storage;
