//! ShopHub storefront library.
//!
//! Session logic for a demo storefront: a persisted cart, a demo sign-in
//! backed by an in-memory user directory, reconciliation of a pre-login
//! cart with the saved one, and a simulated checkout. Products come from a
//! cached, read-only catalog API client.
//!
//! The `shophub` CLI is the front end; everything here is plain library
//! code so it can be driven from tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod storage;

pub use error::{AppError, Result};
pub use session::ShopSession;
