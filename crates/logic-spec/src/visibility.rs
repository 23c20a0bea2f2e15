use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Visible,
    Hidden,
}

impl Visibility {
    pub fn is_visible(self) -> bool {
        matches!(self, Visibility::Visible)
    }
}

pub type VisibilityMap = BTreeMap<String, Visibility>;

/// Ids whose visibility matches `wanted`, in map (id) order.
pub fn ids_with(map: &VisibilityMap, wanted: Visibility) -> Vec<String> {
    map.iter()
        .filter(|(_, visibility)| **visibility == wanted)
        .map(|(id, _)| id.clone())
        .collect()
}
