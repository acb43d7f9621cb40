//! Content-fetch layer and offline asset cache policy for the agency site.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
