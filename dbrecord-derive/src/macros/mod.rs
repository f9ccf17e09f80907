//! Macro implementations

pub mod db_record;

pub use db_record::derive_db_record;
