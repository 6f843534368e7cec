//! Cartesian expansion of slot candidates into concrete combinations,
//! filtered by the offer/disclaimer consistency rule.

use crate::{
    model::Component,
    naming::variant_key,
    slots::{DISCLAIMER_MARKER, OFFER_MARKER},
};

/// Full cartesian product over the slot candidate lists. Zero slots yield
/// exactly one empty combination, so a slotless template still renders
/// once; an empty candidate list yields no combinations at all.
pub fn expand<'a>(slot_candidates: &[Vec<&'a Component>]) -> Vec<Vec<&'a Component>> {
    let mut combos: Vec<Vec<&'a Component>> = vec![Vec::new()];
    for candidates in slot_candidates {
        let mut next = Vec::with_capacity(combos.len().saturating_mul(candidates.len()));
        for combo in &combos {
            for &candidate in candidates {
                let mut extended = Vec::with_capacity(combo.len() + 1);
                extended.extend_from_slice(combo);
                extended.push(candidate);
                next.push(extended);
            }
        }
        combos = next;
    }
    combos
}

/// The disclaimer shown must match the offer shown: when a combination
/// carries both an offer-set and a disclaimer-set member and both names
/// produce a variant key, differing keys disqualify it. A missing key on
/// either side keeps the combination.
pub fn is_consistent(combination: &[&Component]) -> bool {
    let offer = combination
        .iter()
        .find(|c| set_name_contains(c, OFFER_MARKER));
    let disclaimer = combination
        .iter()
        .find(|c| set_name_contains(c, DISCLAIMER_MARKER));
    let (Some(offer), Some(disclaimer)) = (offer, disclaimer) else {
        return true;
    };
    match (variant_key(&offer.name), variant_key(&disclaimer.name)) {
        (Some(offer_key), Some(disclaimer_key)) => offer_key == disclaimer_key,
        _ => true,
    }
}

pub fn expand_valid<'a>(slot_candidates: &[Vec<&'a Component>]) -> Vec<Vec<&'a Component>> {
    expand(slot_candidates)
        .into_iter()
        .filter(|combo| is_consistent(combo))
        .collect()
}

fn set_name_contains(component: &Component, marker: &str) -> bool {
    component
        .component_set_name
        .as_deref()
        .is_some_and(|set| set.contains(marker))
}
