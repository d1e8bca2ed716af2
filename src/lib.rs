//! sitecraft: website-builder wizard service.

pub mod account;
pub mod api;
pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod notify;
pub mod payment;
pub mod wizard;
