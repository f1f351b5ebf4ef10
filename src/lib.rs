pub mod app;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod download;
pub mod error;
pub mod index;
pub mod listing;
pub mod output;
pub mod range;
pub mod roster;
pub mod store;
