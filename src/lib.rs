//! Magazine - data layer for a magazine content-management system
//!
//! Issues, sections, contributors, tags and content (plain, image, article)
//! stored in SQLite or MySQL, with:
//! - at most one featured content item per issue and section
//! - deterministic upload paths for media assets

pub mod config;
pub mod db;
pub mod media;
pub mod models;
pub mod services;
