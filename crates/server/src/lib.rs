//! Basket server library.
//!
//! Shared grocery lists over HTTP: accounts, lists filled from a catalogue or
//! by hand, item images, and share links that add the visitor to a list.
//! The binary in `main.rs` wires this library to `PostgreSQL`; tests wire it
//! to the in-memory adapters.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod blob;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
