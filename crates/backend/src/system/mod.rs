pub mod auth;
pub mod middleware;
pub mod tasks;
pub mod tracing;
