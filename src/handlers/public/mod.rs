// handlers/public/mod.rs - allow-listed handlers, no token required
pub mod auth;
pub mod health;
