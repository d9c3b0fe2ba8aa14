//! Element resolution.
//!
//! The bridge exchanges data with eight named elements of the treatment train.
//! They are looked up once per realization, in a fixed order, and the first
//! failing lookup aborts the rest.

use crate::config::ElementNames;
use crate::error::{BridgeError, BridgeResult};
use sb_engine::{Engine, ObjectKind};
use tracing::debug;

/// Position of an element in the treatment train.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementRole {
    Subcatchment,
    Bioswale,
    Detention,
    Retention,
    Outfall,
    BioswaleToDetention,
    DetentionToRetention,
    RetentionToOutfall,
}

impl ElementRole {
    /// Resolution order.
    pub const ORDER: [ElementRole; 8] = [
        ElementRole::Subcatchment,
        ElementRole::Bioswale,
        ElementRole::Detention,
        ElementRole::Retention,
        ElementRole::Outfall,
        ElementRole::BioswaleToDetention,
        ElementRole::DetentionToRetention,
        ElementRole::RetentionToOutfall,
    ];

    pub const fn kind(self) -> ObjectKind {
        match self {
            ElementRole::Subcatchment => ObjectKind::Subcatchment,
            ElementRole::Bioswale
            | ElementRole::Detention
            | ElementRole::Retention
            | ElementRole::Outfall => ObjectKind::Node,
            ElementRole::BioswaleToDetention
            | ElementRole::DetentionToRetention
            | ElementRole::RetentionToOutfall => ObjectKind::Link,
        }
    }

    pub const fn kind_label(self) -> &'static str {
        match self {
            ElementRole::Subcatchment => "Subcatchment",
            ElementRole::Bioswale | ElementRole::Detention | ElementRole::Retention => {
                "Storage node"
            }
            ElementRole::Outfall => "Outfall",
            _ => "Link",
        }
    }

    pub const fn purpose(self) -> &'static str {
        match self {
            ElementRole::Subcatchment => "runoff source",
            ElementRole::Bioswale => "bioswale",
            ElementRole::Detention => "detention",
            ElementRole::Retention => "retention",
            ElementRole::Outfall => "outfall",
            ElementRole::BioswaleToDetention => "bioswale to detention",
            ElementRole::DetentionToRetention => "detention to retention",
            ElementRole::RetentionToOutfall => "retention to outfall",
        }
    }
}

/// A named element and, while the session is running, its engine index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementHandle {
    pub role: ElementRole,
    pub name: String,
    resolved: Option<usize>,
}

impl ElementHandle {
    pub fn new(role: ElementRole, name: impl Into<String>) -> Self {
        Self {
            role,
            name: name.into(),
            resolved: None,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.role.kind()
    }

    /// Engine index, `None` while unresolved.
    pub fn index(&self) -> Option<usize> {
        self.resolved
    }
}

/// Engine indices of all eight elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedElements {
    pub subcatchment: usize,
    pub storage: [usize; 3],
    pub outfall: usize,
    pub links: [usize; 3],
}

impl ResolvedElements {
    fn from_indices(ix: [usize; 8]) -> Self {
        Self {
            subcatchment: ix[0],
            storage: [ix[1], ix[2], ix[3]],
            outfall: ix[4],
            links: [ix[5], ix[6], ix[7]],
        }
    }
}

fn name_of(names: &ElementNames, role: ElementRole) -> &str {
    match role {
        ElementRole::Subcatchment => &names.subcatchment,
        ElementRole::Bioswale => &names.storage[0],
        ElementRole::Detention => &names.storage[1],
        ElementRole::Retention => &names.storage[2],
        ElementRole::Outfall => &names.outfall,
        ElementRole::BioswaleToDetention => &names.links[0],
        ElementRole::DetentionToRetention => &names.links[1],
        ElementRole::RetentionToOutfall => &names.links[2],
    }
}

/// Position of `role` in [`ElementRole::ORDER`].
const fn slot_of(role: ElementRole) -> usize {
    match role {
        ElementRole::Subcatchment => 0,
        ElementRole::Bioswale => 1,
        ElementRole::Detention => 2,
        ElementRole::Retention => 3,
        ElementRole::Outfall => 4,
        ElementRole::BioswaleToDetention => 5,
        ElementRole::DetentionToRetention => 6,
        ElementRole::RetentionToOutfall => 7,
    }
}

/// The eight handles, kept in [`ElementRole::ORDER`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementSet {
    handles: [ElementHandle; 8],
}

impl ElementSet {
    pub fn from_names(names: &ElementNames) -> Self {
        Self {
            handles: ElementRole::ORDER.map(|role| ElementHandle::new(role, name_of(names, role))),
        }
    }

    pub fn handles(&self) -> &[ElementHandle] {
        &self.handles
    }

    pub fn get(&self, role: ElementRole) -> &ElementHandle {
        &self.handles[slot_of(role)]
    }

    pub fn is_resolved(&self) -> bool {
        self.handles.iter().all(|h| h.resolved.is_some())
    }

    pub fn is_reset(&self) -> bool {
        self.handles.iter().all(|h| h.resolved.is_none())
    }

    pub fn reset(&mut self) {
        for handle in &mut self.handles {
            handle.resolved = None;
        }
    }

    /// Look up every element in order.
    ///
    /// The subcatchment must also lie inside the engine's subcatchment count.
    /// On failure all handles are left unresolved.
    pub fn resolve<E: Engine + ?Sized>(&mut self, engine: &E) -> BridgeResult<ResolvedElements> {
        self.reset();
        let mut indices = [0usize; 8];
        for (slot, handle) in self.handles.iter().enumerate() {
            let raw = engine.index_of(handle.kind(), &handle.name);
            debug!(role = ?handle.role, name = %handle.name, index = raw, "resolved element");
            let index = match usize::try_from(raw) {
                Ok(index) => index,
                Err(_) => {
                    return Err(BridgeError::ElementNotFound {
                        role: handle.role,
                        name: handle.name.clone(),
                    });
                }
            };
            if handle.role == ElementRole::Subcatchment {
                let count = engine.count(ObjectKind::Subcatchment);
                debug!(count, index, "subcatchment range check");
                if raw >= count {
                    return Err(BridgeError::SubcatchmentOutOfRange {
                        name: handle.name.clone(),
                        index: raw,
                        count,
                    });
                }
            }
            indices[slot] = index;
        }
        for (handle, index) in self.handles.iter_mut().zip(indices) {
            handle.resolved = Some(index);
        }
        Ok(ResolvedElements::from_indices(indices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sb_engine::testing::{EngineCall, ScriptedEngine};

    fn set() -> ElementSet {
        ElementSet::from_names(&ElementNames::default())
    }

    #[test]
    fn handles_follow_fixed_order() {
        let names: Vec<_> = set().handles().iter().map(|h| h.name.clone()).collect();
        assert_eq!(names, ["S1", "ST1", "ST2", "ST3", "J2", "C1", "C2", "C3"]);
        assert!(set().is_reset());
    }

    #[test]
    fn every_role_maps_to_its_own_handle() {
        let elements = set();
        for (slot, role) in ElementRole::ORDER.into_iter().enumerate() {
            assert_eq!(slot_of(role), slot);
            assert_eq!(elements.get(role).role, role);
        }
        assert_eq!(elements.get(ElementRole::DetentionToRetention).name, "C2");
    }

    #[test]
    fn resolves_treatment_train() {
        let engine = ScriptedEngine::treatment_train();
        let mut elements = set();
        let resolved = elements.resolve(&engine).unwrap();
        assert_eq!(resolved.subcatchment, 0);
        assert_eq!(resolved.storage, [0, 1, 2]);
        assert_eq!(resolved.outfall, 3);
        assert_eq!(resolved.links, [0, 1, 2]);
        assert!(elements.is_resolved());
        assert_eq!(elements.get(ElementRole::Outfall).index(), Some(3));
    }

    #[test]
    fn first_missing_element_wins_and_stops_lookup() {
        let engine = ScriptedEngine::treatment_train()
            .without_element(ObjectKind::Node, "ST2")
            .without_element(ObjectKind::Link, "C1");
        let mut elements = set();
        let err = elements.resolve(&engine).unwrap_err();
        assert_eq!(
            err,
            BridgeError::ElementNotFound {
                role: ElementRole::Detention,
                name: "ST2".into()
            }
        );
        assert!(elements.is_reset());
        let looked_up_c1 = engine.calls().iter().any(|c| {
            matches!(c, EngineCall::GetIndex { name, .. } if name == "C1")
        });
        assert!(!looked_up_c1);
    }

    #[test]
    fn subcatchment_outside_count_is_rejected() {
        let engine = ScriptedEngine::treatment_train().with_count(ObjectKind::Subcatchment, 0);
        let err = set().resolve(&engine).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::SubcatchmentOutOfRange { index: 0, count: 0, .. }
        ));
    }

    #[test]
    fn missing_subcatchment_reported_before_range() {
        let engine =
            ScriptedEngine::treatment_train().without_element(ObjectKind::Subcatchment, "S1");
        let err = set().resolve(&engine).unwrap_err();
        assert!(err.to_string().contains("S1"));
        assert!(matches!(err, BridgeError::ElementNotFound { .. }));
    }

    #[test]
    fn reset_clears_indices() {
        let engine = ScriptedEngine::treatment_train();
        let mut elements = set();
        elements.resolve(&engine).unwrap();
        elements.reset();
        assert!(elements.is_reset());
    }
}
