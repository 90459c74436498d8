//! rigcheck Codec - Lossless persistence for validators
//!
//! Validators are stored as one JSON document keyed by validator name.
//! Node records carry a type discriminator (`10` source, `20` connection,
//! `30` default value) so decoding needs no outside type hints. Saving
//! replaces the whole file atomically.

mod decoder;
mod encoder;
mod format;

pub use decoder::{
    decode, decode_each, decode_record, from_record, load_document, load_validators,
    load_validators_string,
};
pub use encoder::{
    encode, encode_all, save_document, save_validators, save_validators_string, to_record,
};
pub use format::{AddressRecord, Document, NodeRecord, ValidatorRecord, FORMAT_VERSION};
