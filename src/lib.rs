//! Backend for a small used-book marketplace: accounts, bearer tokens and
//! owner-guarded book listings over a JSON API.

pub mod app;
pub mod auth;
pub mod books;
pub mod config;
pub mod db;
pub mod error;
pub mod memory;
pub mod state;

pub use app::{build_app, serve};
pub use error::AppError;
pub use state::AppState;
