//! Attribute addressing
//!
//! An [`AttributeAddress`] points at exactly one attribute slot on one
//! object. Array elements and compound children are told apart by
//! [`AttrSlot`], so an address can never claim to be both at once.

use crate::error::{Result, RigError};
use crate::value::AttrValue;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Which part of an attribute an address refers to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AttrSlot {
    /// A plain scalar (or whole) attribute
    #[default]
    Plain,
    /// Logical index into an array attribute
    Element(u32),
    /// Ordinal position among a compound attribute's children
    Child(u32),
}

/// A disambiguated pointer to one attribute slot, plus a value snapshot.
///
/// Identity covers the owner, name and slot. The `value` is excluded from
/// equality and hashing.
#[derive(Debug, Clone)]
pub struct AttributeAddress {
    pub owner_long_name: String,
    /// Attribute name in its natural, non-indexed form
    pub attribute_name: String,
    pub slot: AttrSlot,
    /// Last known value, `None` for relationship-only attributes
    pub value: Option<AttrValue>,
}

impl AttributeAddress {
    /// Address a plain attribute
    pub fn new(owner: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            owner_long_name: owner.into(),
            attribute_name: attribute.into(),
            slot: AttrSlot::Plain,
            value: None,
        }
    }

    /// Address one logical element of an array attribute
    pub fn element(owner: impl Into<String>, attribute: impl Into<String>, index: u32) -> Self {
        Self::new(owner, attribute).with_slot(AttrSlot::Element(index))
    }

    /// Address one child of a compound attribute
    pub fn child(owner: impl Into<String>, attribute: impl Into<String>, ordinal: u32) -> Self {
        Self::new(owner, attribute).with_slot(AttrSlot::Child(ordinal))
    }

    /// Rebuild an address from its flag-and-index form.
    ///
    /// Fails when both flags are set, when a flag has no index, or when an
    /// index is given for a plain attribute.
    pub fn from_flags(
        owner: impl Into<String>,
        attribute: impl Into<String>,
        is_array_element: bool,
        is_compound_child: bool,
        index: Option<i64>,
    ) -> Result<Self> {
        let attribute = attribute.into();
        let index = match index {
            Some(i) => Some(u32::try_from(i).map_err(|_| {
                RigError::InvalidAddress(format!("{}: index {} out of range", attribute, i))
            })?),
            None => None,
        };

        let slot = match (is_array_element, is_compound_child, index) {
            (true, true, _) => {
                return Err(RigError::InvalidAddress(format!(
                    "{}: cannot be both an array element and a compound child",
                    attribute
                )))
            }
            (true, false, Some(i)) => AttrSlot::Element(i),
            (false, true, Some(i)) => AttrSlot::Child(i),
            (false, false, None) => AttrSlot::Plain,
            (false, false, Some(_)) => {
                return Err(RigError::InvalidAddress(format!(
                    "{}: index given for a plain attribute",
                    attribute
                )))
            }
            (_, _, None) => {
                return Err(RigError::InvalidAddress(format!(
                    "{}: indexed attribute without an index",
                    attribute
                )))
            }
        };

        Ok(Self::new(owner, attribute).with_slot(slot))
    }

    /// Parse the bracketed display form of an attribute: `attr` or `attr[3]`
    pub fn parse_display(owner: impl Into<String>, display: &str) -> Result<Self> {
        let display = display.trim();
        if display.is_empty() {
            return Err(RigError::InvalidAddress("empty attribute name".to_string()));
        }

        match display.find('[') {
            None => {
                if display.contains(']') {
                    return Err(RigError::InvalidAddress(display.to_string()));
                }
                Ok(Self::new(owner, display))
            }
            Some(open) => {
                let name = &display[..open];
                let rest = &display[open + 1..];
                let index = rest
                    .strip_suffix(']')
                    .and_then(|digits| digits.parse::<u32>().ok());
                match index {
                    Some(index) if !name.is_empty() => Ok(Self::element(owner, name, index)),
                    _ => Err(RigError::InvalidAddress(display.to_string())),
                }
            }
        }
    }

    pub fn with_slot(mut self, slot: AttrSlot) -> Self {
        self.slot = slot;
        self
    }

    pub fn with_value(mut self, value: impl Into<AttrValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn is_array_element(&self) -> bool {
        matches!(self.slot, AttrSlot::Element(_))
    }

    pub fn is_compound_child(&self) -> bool {
        matches!(self.slot, AttrSlot::Child(_))
    }

    /// Element index or child ordinal, `None` for plain attributes
    pub fn index(&self) -> Option<u32> {
        match self.slot {
            AttrSlot::Plain => None,
            AttrSlot::Element(i) | AttrSlot::Child(i) => Some(i),
        }
    }

    /// Attribute part of the display form, e.g. `weights[2]`
    pub fn display_attribute(&self) -> String {
        match self.slot {
            AttrSlot::Element(i) => format!("{}[{}]", self.attribute_name, i),
            AttrSlot::Plain | AttrSlot::Child(_) => self.attribute_name.clone(),
        }
    }

    /// Full display form, e.g. `|rig|ctrl_L.weights[2]`
    pub fn display_path(&self) -> String {
        format!("{}.{}", self.owner_long_name, self.display_attribute())
    }

    /// Same slot, ignoring the value snapshot
    pub fn same_slot(&self, other: &Self) -> bool {
        self == other
    }
}

impl PartialEq for AttributeAddress {
    fn eq(&self, other: &Self) -> bool {
        self.owner_long_name == other.owner_long_name
            && self.attribute_name == other.attribute_name
            && self.slot == other.slot
    }
}

impl Eq for AttributeAddress {}

impl Hash for AttributeAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owner_long_name.hash(state);
        self.attribute_name.hash(state);
        self.slot.hash(state);
    }
}

impl fmt::Display for AttributeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_path())
    }
}

/// Split a plug path such as `|grp|obj.attr[2]` into object and attribute parts.
///
/// Object paths never contain `.`, so the split happens at the first `.`
/// after the last `|`.
pub fn split_plug_path(path: &str) -> Result<(&str, &str)> {
    let leaf_start = path.rfind('|').map(|i| i + 1).unwrap_or(0);
    let dot = path[leaf_start..]
        .find('.')
        .map(|i| i + leaf_start)
        .ok_or_else(|| RigError::InvalidAddress(format!("'{}' has no attribute part", path)))?;

    let (object, attribute) = (&path[..dot], &path[dot + 1..]);
    if object.is_empty() || attribute.is_empty() {
        return Err(RigError::InvalidAddress(path.to_string()));
    }
    Ok((object, attribute))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identity_ignores_value() {
        let a = AttributeAddress::new("ctrl_L", "showCloth").with_value(true);
        let b = AttributeAddress::new("ctrl_L", "showCloth").with_value(false);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_identity_includes_slot() {
        let element = AttributeAddress::element("skin", "weights", 1);
        let child = AttributeAddress::child("skin", "weights", 1);
        let plain = AttributeAddress::new("skin", "weights");
        assert_ne!(element, child);
        assert_ne!(element, plain);
        assert_ne!(child, plain);
    }

    #[test]
    fn test_flags_are_exclusive() {
        assert!(AttributeAddress::from_flags("n", "a", true, true, Some(0)).is_err());
        assert!(AttributeAddress::from_flags("n", "a", true, false, None).is_err());
        assert!(AttributeAddress::from_flags("n", "a", false, false, Some(2)).is_err());
        assert!(AttributeAddress::from_flags("n", "a", false, true, Some(-1)).is_err());

        let addr = AttributeAddress::from_flags("n", "a", false, true, Some(2)).unwrap();
        assert!(addr.is_compound_child());
        assert!(!addr.is_array_element());
        assert_eq!(addr.index(), Some(2));
    }

    #[test]
    fn test_parse_display() {
        let addr = AttributeAddress::parse_display("skin", "weights[12]").unwrap();
        assert_eq!(addr.slot, AttrSlot::Element(12));
        assert_eq!(addr.attribute_name, "weights");
        assert_eq!(addr.display_path(), "skin.weights[12]");

        let addr = AttributeAddress::parse_display("ctrl_L", "rotateOrder").unwrap();
        assert_eq!(addr.slot, AttrSlot::Plain);
        assert_eq!(addr.index(), None);

        assert!(AttributeAddress::parse_display("n", "").is_err());
        assert!(AttributeAddress::parse_display("n", "w[x]").is_err());
        assert!(AttributeAddress::parse_display("n", "[3]").is_err());
        assert!(AttributeAddress::parse_display("n", "w]").is_err());
    }

    #[test]
    fn test_split_plug_path() {
        assert_eq!(
            split_plug_path("|rig|ctrl_L.showCloth").unwrap(),
            ("|rig|ctrl_L", "showCloth")
        );
        assert_eq!(
            split_plug_path("ns:ctrl_L.translate.translateX").unwrap(),
            ("ns:ctrl_L", "translate.translateX")
        );
        assert_eq!(split_plug_path("skin.weights[3]").unwrap(), ("skin", "weights[3]"));
        assert!(split_plug_path("|rig|ctrl_L").is_err());
        assert!(split_plug_path(".visibility").is_err());
    }
}
