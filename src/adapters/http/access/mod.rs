//! HTTP adapter for trials, checkouts, the access overview and subscriptions.

pub mod dto;
mod handlers;
mod routes;

pub use routes::access_routes;
