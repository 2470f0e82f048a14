pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod itinerary;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
