//! Core data model shared by the mapper, stores, executor, and scheduler.

pub mod schema;
pub mod value;

pub use schema::{Column, KeyValue, TargetColumn, TargetSchema, Watermark};
pub use value::{Row, SqlValue};
