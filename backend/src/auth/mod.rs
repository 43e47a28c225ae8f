//! Authentication and account lifecycle.
//!
//! Request models, HTTP handlers, session middleware and route definitions
//! for registration, activation, login and password reset.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
