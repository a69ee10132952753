//! Hierarchical grid engine with a terminal browser on top.

pub mod app;
pub mod components;
pub mod config;
pub mod error;
pub mod event;
pub mod handler;
pub mod logging;
pub mod print;
pub mod remote;
pub mod theme;
pub mod tree;
pub mod tui;
pub mod ui;
