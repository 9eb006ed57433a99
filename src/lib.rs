//! UNSWtalk - a small social network for UNSW students
//!
//! Students sign up with their zID, post messages and media, comment and
//! reply, befriend each other and get friend suggestions from shared
//! course enrolments. Pages are rendered on the server.
//!
//! # Architecture
//! - `storage`: sea-orm data access over SQLite, MySQL or PostgreSQL
//! - `services`: accounts, content, feed, friends, profiles, mail and media
//! - `api`: actix-web handlers, middleware and session tokens
//! - `views`: embedded HTML templates and page rendering
//! - `interfaces`: operator CLI commands
//! - `config`: static configuration
//! - `runtime`: server startup and shutdown
//! - `system`: logging

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
pub mod views;
