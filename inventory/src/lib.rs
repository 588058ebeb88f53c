//! Barcode-driven inventory tracking.
//!
//! The crate is a small hexagon: [`domain`] holds the entities, the
//! [`domain::ports::InventoryStore`] port and the [`domain::InventoryService`]
//! that stages and commits stock movements. [`outbound`] provides two
//! interchangeable adapters for the port: a PostgREST client with a polling
//! subscription, and a local JSON document store.

pub mod config;
pub mod domain;
pub mod outbound;
