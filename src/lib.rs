pub mod admin;
pub mod analytics;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod state;
pub mod telemetry;
pub mod users;

#[cfg(test)]
mod test_support;
