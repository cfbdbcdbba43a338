//! Adapter implementations of the port traits

pub mod duckdb;

pub use duckdb::DuckDbRepository;
