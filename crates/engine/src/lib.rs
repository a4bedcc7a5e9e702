//! SQLite backend for versakv
//!
//! Provides `SqliteStore`, the relational implementation of
//! `DataItemStore`, together with its configuration (`StoreConfig`,
//! loaded from `versakv.toml`) and schema.
//!
//! The engine relies on SQLite for durability and per-operation atomicity;
//! it holds no mutable in-process state beyond the shared connection pool.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod database;
mod error;

pub use database::{schema, SqliteStore, StoreConfig, CONFIG_FILE_NAME, DATABASE_FILE_NAME};
