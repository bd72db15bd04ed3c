//! Window-id to surface-role mapping.
//!
//! Built once after all surfaces exist and read-only while the loop runs.
//! Events carrying an id no surface owns resolve to `None` and are dropped
//! by the caller instead of indexing anything.

use std::collections::HashMap;
use std::hash::Hash;

/// Role of a surface in the dual-surface pipeline.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SurfaceRole {
    /// Renders the scene and is read back every frame.
    Primary,
    /// Displays the primary's readback as a point field.
    Secondary,
}

/// Immutable-after-construction lookup from native window id to role.
///
/// Generic over the key so the mapping logic stays testable without creating
/// native windows.
#[derive(Debug, Default)]
pub struct SurfaceRegistry<K> {
    entries: HashMap<K, SurfaceRole>,
}

impl<K: Eq + Hash> SurfaceRegistry<K> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registers a surface. Intended to be called once per role during
    /// startup, before the loop begins.
    pub fn insert(&mut self, id: K, role: SurfaceRole) {
        self.entries.insert(id, role);
    }

    /// Resolves an id to its role. Unknown ids yield `None`.
    pub fn role_of(&self, id: &K) -> Option<SurfaceRole> {
        self.entries.get(id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_registered_ids() {
        let mut reg = SurfaceRegistry::new();
        reg.insert(11u64, SurfaceRole::Primary);
        reg.insert(42u64, SurfaceRole::Secondary);

        assert_eq!(reg.role_of(&11), Some(SurfaceRole::Primary));
        assert_eq!(reg.role_of(&42), Some(SurfaceRole::Secondary));
    }

    #[test]
    fn unknown_id_is_none_not_a_panic() {
        let mut reg = SurfaceRegistry::new();
        reg.insert(11u64, SurfaceRole::Primary);

        assert_eq!(reg.role_of(&999), None);
    }
}
