//! MySQL implementation of the product store.

mod queries;
mod store;

pub use store::MySqlProductStore;
