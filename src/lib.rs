pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod pages;
pub mod query;
pub mod render;
pub mod theme;
