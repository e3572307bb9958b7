/// Database connection and schema creation
pub mod database;

/// Seed data loading from config.toml
pub mod seed;

/// Server settings from environment variables
pub mod server;
