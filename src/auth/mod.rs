pub mod auth_handler;
pub mod middleware;
pub mod session;
