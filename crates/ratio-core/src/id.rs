use serde::{Deserialize, Serialize};

/// Identifies an item in the production graph. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u32);

/// Identifies a (possibly modded) building in the production graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildingId(pub u32);

/// Identifies a module definition in the production graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub u32);

impl ItemId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl BuildingId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl ModuleId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_id_equality() {
        let a = ItemId(0);
        let b = ItemId(0);
        let c = ItemId(1);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn building_id_copy() {
        let a = BuildingId(5);
        let b = a; // Copy
        assert_eq!(a, b);
        assert_eq!(b.index(), 5);
    }

    #[test]
    fn ids_are_hashable() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ItemId(0), "iron-ore");
        map.insert(ItemId(1), "iron-plate");
        assert_eq!(map[&ItemId(0)], "iron-ore");
    }
}
