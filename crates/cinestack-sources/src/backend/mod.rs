pub mod api;
pub mod auth;
pub mod client;

pub use auth::{login, register};
pub use client::CineStackClient;
