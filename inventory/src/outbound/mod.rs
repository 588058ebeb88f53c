//! Outbound adapters implementing the inventory store port.

pub mod local;
pub mod rest;
