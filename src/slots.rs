//! Per-template planning: classify each layer, then resolve the ordered
//! candidate list for every swappable slot.
//!
//! The plan is the single source of truth for both the count estimate and
//! the render loop, so the two can never disagree about what a selection
//! produces.

use std::collections::HashSet;

use crate::{
    catalog::ComponentCatalog,
    model::{Component, Layer, Selection, Snapshot, Template},
    naming::{base_set_name, is_hero_name, variant_key},
};

/// Substring marking a variant set as a price offer.
pub(crate) const OFFER_MARKER: &str = "Offer";
/// Substring marking a variant set as a legal disclaimer.
pub(crate) const DISCLAIMER_MARKER: &str = "Disclaimer";
/// Offer remapping always sources from this exact set name.
const BASE_OFFER_SET: &str = "Offer";
/// Set names eligible as wide-layout offer targets.
const WIDE_OFFER_SETS: [&str; 3] = ["Offer_Wide", "Offer Wide", "Offer-Wide"];

/// What the render loop does with one layer. Parallel to `Template::layers`.
#[derive(Clone, Copy, Debug)]
pub enum PlannedRole<'a> {
    /// Swappable slot; the index points into `TemplatePlan::slots`.
    Slot(usize),
    /// Instance layer with no viable candidates; painted with its one
    /// resolved component (or nothing) in every output.
    Fixed(Option<&'a Component>),
    /// Placeholder filled by the per-iteration background image.
    ImageSlot,
    /// Text or shape painted from the layer's own data.
    Static,
}

/// One selected template with its slot candidates resolved.
pub struct TemplatePlan<'a> {
    pub template: &'a Template,
    pub roles: Vec<PlannedRole<'a>>,
    /// Candidate lists in slot order; every inner list is non-empty.
    pub slots: Vec<Vec<&'a Component>>,
    /// Whether any layer is a background-image slot.
    pub wants_image: bool,
}

/// Plans every selected template, in snapshot order.
pub fn plan_selected<'a>(snapshot: &'a Snapshot, selection: &Selection) -> Vec<TemplatePlan<'a>> {
    let catalog = ComponentCatalog::new(&snapshot.components);
    snapshot
        .templates
        .iter()
        .filter(|t| selection.template_ids.contains(&t.id))
        .map(|t| plan_template(t, &catalog, &selection.component_ids))
        .collect()
}

pub fn plan_template<'a>(
    template: &'a Template,
    catalog: &ComponentCatalog<'a>,
    selected_components: &HashSet<String>,
) -> TemplatePlan<'a> {
    let mut roles = Vec::with_capacity(template.layers.len());
    let mut slots: Vec<Vec<&'a Component>> = Vec::new();
    let mut wants_image = false;

    for layer in &template.layers {
        // The hero name check outranks the declared layer type.
        if is_hero_name(&layer.name) {
            wants_image = true;
            roles.push(PlannedRole::ImageSlot);
            continue;
        }

        let original = catalog.resolve_layer(layer);
        if !layer.kind.is_instance() && original.is_none() {
            roles.push(PlannedRole::Static);
            continue;
        }

        let candidates =
            resolve_candidates(&template.name, layer, original, catalog, selected_components);
        if !candidates.is_empty() {
            slots.push(candidates);
            roles.push(PlannedRole::Slot(slots.len() - 1));
        } else if layer.kind.is_instance() {
            roles.push(PlannedRole::Fixed(original));
        } else {
            // A name-matched shape with nothing to swap keeps its own paint.
            roles.push(PlannedRole::Static);
        }
    }

    TemplatePlan {
        template,
        roles,
        slots,
        wants_image,
    }
}

/// Ordered eligible candidates for one component slot. Ordering follows
/// library order; downstream combination order depends on it.
pub fn resolve_candidates<'a>(
    template_name: &str,
    layer: &Layer,
    original: Option<&'a Component>,
    catalog: &ComponentCatalog<'a>,
    selected_components: &HashSet<String>,
) -> Vec<&'a Component> {
    let Some(original) = original else {
        return fallback_set_candidates(layer, catalog, selected_components);
    };
    let Some(set_name) = original
        .component_set_name
        .as_deref()
        .filter(|s| !s.is_empty())
    else {
        return vec![original];
    };

    if set_name.contains(OFFER_MARKER) {
        offer_candidates(template_name, catalog, selected_components)
    } else if set_name.contains(DISCLAIMER_MARKER) {
        // Disclaimers are never user-filtered; the cross-slot filter pairs
        // each variant with its matching offer downstream.
        catalog.set_members(set_name)
    } else {
        let members = catalog.set_members(set_name);
        let chosen: Vec<_> = members
            .iter()
            .copied()
            .filter(|c| selected_components.contains(&c.id))
            .collect();
        if chosen.is_empty() { vec![original] } else { chosen }
    }
}

fn is_wide_template(template_name: &str) -> bool {
    template_name.contains("Template_Long") || template_name.contains("Template_Wide")
}

/// Offer slots always source from the base `Offer` set, whichever offer set
/// the layer itself resolved to. Wide layouts then remap every source to
/// its same-key member of a wide set; a remap miss drops that source.
fn offer_candidates<'a>(
    template_name: &str,
    catalog: &ComponentCatalog<'a>,
    selected_components: &HashSet<String>,
) -> Vec<&'a Component> {
    let base = catalog.set_members(BASE_OFFER_SET);
    let chosen: Vec<_> = base
        .iter()
        .copied()
        .filter(|c| selected_components.contains(&c.id))
        .collect();
    let sources = if chosen.is_empty() { base } else { chosen };

    if !is_wide_template(template_name) {
        return sources;
    }
    sources
        .into_iter()
        .filter_map(|source| {
            let key = variant_key(&source.name)?;
            let wide = catalog.components().iter().find(|c| {
                c.component_set_name
                    .as_deref()
                    .is_some_and(|set| WIDE_OFFER_SETS.contains(&set))
                    && variant_key(&c.name).as_deref() == Some(key.as_str())
            });
            if wide.is_none() {
                tracing::debug!(source = %source.name, "offer has no wide variant, dropping");
            }
            wide
        })
        .collect()
}

/// Last resort when no component resolved: treat the first `/`-segment of
/// the cleaned layer name as a set name. Selected members win, else the
/// set's first member, else nothing.
fn fallback_set_candidates<'a>(
    layer: &Layer,
    catalog: &ComponentCatalog<'a>,
    selected_components: &HashSet<String>,
) -> Vec<&'a Component> {
    let set_name = base_set_name(&layer.name);
    if set_name.is_empty() {
        return Vec::new();
    }
    let members = catalog.set_members(&set_name);
    let chosen: Vec<_> = members
        .iter()
        .copied()
        .filter(|c| selected_components.contains(&c.id))
        .collect();
    if !chosen.is_empty() {
        chosen
    } else {
        members.into_iter().take(1).collect()
    }
}
