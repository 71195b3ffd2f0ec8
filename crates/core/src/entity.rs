//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Entities are transient until persisted, so the identifier is optional.
/// Identity (not attribute values) decides whether two instances denote the
/// same entity.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier, if one has been assigned.
    fn id(&self) -> Option<&Self::Id>;

    /// Two entities are the same iff both carry an identifier and those match.
    fn same_identity(&self, other: &Self) -> bool {
        match (self.id(), other.id()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}
