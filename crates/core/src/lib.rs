//! Basket Core - Shared types and grocery list domain logic.
//!
//! This crate provides the types and pure logic used across all Basket components:
//! - `server` - HTTP service for lists, items and sharing
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types, traits and pure functions - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows the
//! access rules and totals to be tested without any infrastructure.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, quantities, usernames and share tokens
//! - [`grocery`] - Lists, items and derived totals
//! - [`access`] - Who may view or change a list
//! - [`catalogue`] - The fixed catalogue lists are populated from
//! - [`input`] - Lenient parsing of submitted item fields

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod catalogue;
pub mod grocery;
pub mod input;
pub mod types;

pub use catalogue::{CatalogueItem, CatalogueSelection};
pub use grocery::{GroceryItem, GroceryList, ItemLine, ListTotals, NewGroceryItem, compute_totals};
pub use types::*;
