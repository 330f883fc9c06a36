//! libris: role-driven route materialization and navigation guarding for the
//! library lending admin console.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod guard;
pub mod http;
pub mod identity;
pub mod permission;
pub mod router;
pub mod storage;
pub mod tags_view;

