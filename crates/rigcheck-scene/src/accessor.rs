//! The boundary between rigcheck and a live authoring scene

use rigcheck_core::{AttrValue, AttributeAddress, Result, RigError};

/// Access to a single live, mutable scene.
///
/// Reads take `&self` and edits take `&mut self`; the engine never calls an
/// accessor from more than one thread.
pub trait SceneAccessor {
    /// Whether an object with this long name exists
    fn exists(&self, long_name: &str) -> bool;

    /// Read the live value at an address.
    ///
    /// Relationship-only attributes fail with `RigError::UnreadableAttributeKind`.
    fn read_attribute(&self, address: &AttributeAddress) -> Result<AttrValue>;

    fn write_attribute(&mut self, address: &AttributeAddress, value: &AttrValue) -> Result<()>;

    /// Whether `destination` is currently driven by exactly `source`
    fn is_connected_from(
        &self,
        destination: &AttributeAddress,
        source: &AttributeAddress,
    ) -> Result<bool>;

    fn connect(&mut self, source: &AttributeAddress, destination: &AttributeAddress) -> Result<()>;

    /// Turn a display form (`weights[2]`, `translateX`, `translate.translateX`)
    /// into a fully disambiguated address on `owner_long_name`
    fn resolve_indexed_address(
        &self,
        owner_long_name: &str,
        attribute_name: &str,
    ) -> Result<AttributeAddress>;

    /// Whether [`SceneAccessor::apply_batch`] applies edits atomically
    fn supports_batching(&self) -> bool {
        false
    }

    /// Apply every edit in the batch, or none of them
    fn apply_batch(&mut self, batch: &EditBatch) -> Result<()> {
        let _ = batch;
        Err(RigError::BatchUnsupported)
    }
}

/// A single deferred scene edit
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    Connect {
        source: AttributeAddress,
        destination: AttributeAddress,
    },
    Write {
        address: AttributeAddress,
        value: AttrValue,
    },
}

/// An ordered list of edits to apply as one unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditBatch {
    edits: Vec<Edit>,
}

impl EditBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, source: AttributeAddress, destination: AttributeAddress) {
        self.edits.push(Edit::Connect {
            source,
            destination,
        });
    }

    pub fn write(&mut self, address: AttributeAddress, value: AttrValue) {
        self.edits.push(Edit::Write { address, value });
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}
