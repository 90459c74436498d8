//! rigcheck Core - Foundational types for rigcheck
//!
//! This crate provides the types that all other rigcheck crates depend on:
//! - `AttributeAddress` - Disambiguated attribute slots
//! - `AttrValue`, `ValueComparer` - Value snapshots and comparison
//! - `Status` - Validation outcomes with roll-up precedence
//! - Error types and Result alias

mod address;
mod error;
pub mod name;
mod status;
mod value;

pub use address::{split_plug_path, AttrSlot, AttributeAddress};
pub use error::{Result, RigError};
pub use status::Status;
pub use value::{AttrValue, ValueComparer, MATRIX_LEN};
