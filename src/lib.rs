pub mod airport_search;
pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod events;
pub mod flight_search;
pub mod location;
pub mod logging;
pub mod models;
pub mod ui;
