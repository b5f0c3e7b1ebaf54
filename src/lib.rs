#![doc = "The `todo_api` library crate."]
#![doc = ""]
#![doc = "Application bootstrap, configuration, authentication, domain models, route groups"]
#![doc = "and persistence for the multi-user todo API. The binary (`main.rs`) only loads"]
#![doc = "settings and hands them to [`app::launch`]."]

pub mod app;
pub mod auth;
pub mod chat;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod models;
pub mod routes;
pub mod startup;

pub use app::{launch, Bootstrap, ServeOptions};
pub use config::{AllowedOrigins, Settings};
pub use error::{AppError, BootstrapError};
