pub mod auth;
pub mod config;
pub mod error;
pub mod ident;
pub mod mailer;
pub mod middleware;
pub mod pagination;
pub mod render;
pub mod roles;
pub mod stories;
pub mod users;
