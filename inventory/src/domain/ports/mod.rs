//! Domain ports for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod inventory_store;

#[cfg(test)]
pub use inventory_store::MockInventoryStore;
pub use inventory_store::{InventoryStore, InventoryStoreError};
