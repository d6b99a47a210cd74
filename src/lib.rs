pub mod app;
pub mod config;
pub mod credentials;
pub mod format;
pub mod portal;
pub mod report;
