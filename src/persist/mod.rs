//! Client side of the persistence boundary.

pub mod client;

pub use client::{PersistenceClient, PersistError};
