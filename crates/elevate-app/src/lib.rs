pub mod app;
pub mod error;
pub mod middleware;
pub mod reconciler;
pub mod services_handler;
