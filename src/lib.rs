//! Chess-club membership: users, clubs and the role ladder between them,
//! with an authorization engine gating every transition.

pub mod auth;
pub mod authz;
pub mod config;
pub mod domain;
pub mod error;
pub mod repository;
pub mod service;
