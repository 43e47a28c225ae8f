//! Module for core business logic services.
//!
//! This module encapsulates services that perform specific business operations
//! and orchestrate interactions between different parts of the application,
//! such as the account lifecycle, token issuance and the forum.

pub mod auth_service;
pub mod email_service;
pub mod forum_service;
pub mod session_service;
pub mod token_service;
