//! Document model, persistence, backups and preferences

pub mod backup;
pub mod chapter;
pub mod character;
pub mod clock;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod file_system;
pub mod store;
pub mod validate;
