pub mod achievements;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod navigation;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
pub mod study;
pub mod validation;
