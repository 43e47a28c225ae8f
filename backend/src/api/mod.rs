//! Central module for organizing the application's main API endpoints.
//!
//! This module acts as a top-level container for different API domains,
//! such as the forum and static content, excluding core authentication
//! routes which are handled separately.

pub mod common;
pub mod content;
pub mod forum;
