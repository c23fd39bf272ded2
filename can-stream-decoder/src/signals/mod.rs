//! Message catalogs and the signal codec
//!
//! This module contains the DBC catalog loader, the catalog data model and
//! the bit-level signal codec.

pub mod codec;
pub mod database;
pub mod dbc;

// Re-export key types for convenience
pub use database::{
    ByteOrder, Catalog, CatalogStats, MessageDefinition, MultiplexerInfo, SignalDefinition,
    ValueDescription, ValueType,
};
