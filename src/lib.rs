//! Social relationship engine: follows, friend requests and mutual friendship.
//!
//! The presentation layer resolves the caller once and passes the actor's
//! username into [`services::RelationshipService`]; storage is reached only
//! through [`repository::SocialStore`].

pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod state;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
