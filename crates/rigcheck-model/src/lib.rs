//! rigcheck Model - The declarative validation tree
//!
//! A [`Validator`] owns [`SourceNode`]s, each of which owns the
//! [`DefaultValueNode`] and [`ConnectionValidityNode`] checks declared
//! against one authored object.

mod node;
mod validator;

pub use node::{
    ConnectionValidityNode, DefaultValueNode, NodeMeta, NodeType, SourceNode, ValidityNode,
};
pub use validator::Validator;
