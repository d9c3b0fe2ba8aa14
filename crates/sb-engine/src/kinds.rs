//! Element categories and exchanged properties.
//!
//! Discriminants follow the engine's public API enumerations.

use core::fmt;

/// Category of a named model element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    Gage,
    Subcatchment,
    Node,
    Link,
}

impl ObjectKind {
    pub const fn code(self) -> i32 {
        match self {
            ObjectKind::Gage => 0,
            ObjectKind::Subcatchment => 1,
            ObjectKind::Node => 2,
            ObjectKind::Link => 3,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Gage => "rain gage",
            ObjectKind::Subcatchment => "subcatchment",
            ObjectKind::Node => "node",
            ObjectKind::Link => "link",
        };
        f.write_str(name)
    }
}

/// Scalar property read from or written to an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Property {
    /// Rainfall intensity applied at a gage (writable).
    GageRainfall,
    /// Runoff discharge leaving a subcatchment.
    SubcatchRunoff,
    /// Stored volume at a node.
    NodeVolume,
    /// Routed flow through a link.
    LinkFlow,
}

impl Property {
    pub const fn code(self) -> i32 {
        match self {
            Property::GageRainfall => 100,
            Property::SubcatchRunoff => 205,
            Property::NodeVolume => 305,
            Property::LinkFlow => 410,
        }
    }
}
