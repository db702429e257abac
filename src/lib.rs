pub mod api;
pub mod app;
pub mod bot;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod content;
pub mod db;
pub mod global;
pub mod provider;
