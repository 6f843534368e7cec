use std::collections::HashMap;

use crate::{
    model::{Component, Layer},
    naming::clean_layer_name,
};

/// Id and name index over the component library, rebuilt per call from the
/// snapshot. Keys are the component id, the raw name, and the name with any
/// ` (suffix` stripped; on key collisions the later library entry wins.
pub struct ComponentCatalog<'a> {
    components: &'a [Component],
    by_key: HashMap<&'a str, usize>,
}

impl<'a> ComponentCatalog<'a> {
    pub fn new(components: &'a [Component]) -> Self {
        let mut by_key = HashMap::new();
        for (idx, component) in components.iter().enumerate() {
            if !component.id.is_empty() {
                by_key.insert(component.id.as_str(), idx);
            }
            by_key.insert(component.name.as_str(), idx);
            if let Some(base) = component.name.split(" (").next() {
                by_key.insert(base.trim(), idx);
            }
        }
        Self { components, by_key }
    }

    pub fn components(&self) -> &'a [Component] {
        self.components
    }

    fn lookup(&self, key: &str) -> Option<&'a Component> {
        self.by_key.get(key).map(|&idx| &self.components[idx])
    }

    /// Resolves the library component a layer refers to. Tried in order:
    /// direct id reference, the layer name with any duplicate counter
    /// stripped, the raw layer name, then a case-insensitive scan accepting
    /// the first component whose name extends the layer name, whose base
    /// name prefixes it, or whose set name appears inside it.
    pub fn resolve_layer(&self, layer: &Layer) -> Option<&'a Component> {
        if let Some(id) = layer.component_id.as_deref()
            && !id.is_empty()
            && let Some(component) = self.lookup(id)
        {
            return Some(component);
        }
        let clean = clean_layer_name(&layer.name);
        if let Some(component) = self.lookup(&clean) {
            return Some(component);
        }
        if let Some(component) = self.lookup(&layer.name) {
            return Some(component);
        }

        let clean_lower = clean.to_lowercase();
        self.components.iter().find(|c| {
            let name_lower = c.name.to_lowercase();
            let base_lower = c
                .name
                .split(" (")
                .next()
                .unwrap_or("")
                .to_lowercase();
            name_lower.starts_with(&clean_lower)
                || clean_lower.starts_with(&base_lower)
                || c.component_set_name
                    .as_deref()
                    .is_some_and(|set| !set.is_empty() && clean_lower.contains(&set.to_lowercase()))
        })
    }

    /// All members of a named variant set, in library order.
    pub fn set_members(&self, set_name: &str) -> Vec<&'a Component> {
        self.components
            .iter()
            .filter(|c| c.component_set_name.as_deref() == Some(set_name))
            .collect()
    }
}
