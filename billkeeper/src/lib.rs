//! BillKeeper library
//!
//! Bill tracking over a single persisted application store. This library
//! exposes the store, its storage backends and the screen services.

pub mod app;
pub mod config;
pub mod error;
pub mod services;
pub mod storage;
pub mod store;
