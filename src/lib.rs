pub mod app;
pub mod assays;
pub mod cache;
pub mod config;
pub mod crawler;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod gitlab;
pub mod grid;
pub mod hub;
pub mod investigation;
pub mod output;
pub mod store;
