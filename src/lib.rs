//! Command-line client for a small inventory REST backend, with a
//! client-side entity cache and transient notifications.

pub mod api;
pub mod app;
pub mod cache;
pub mod commands;
pub mod config;
pub mod event;
pub mod logging;
pub mod notify;
pub mod views;
