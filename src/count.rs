//! Dry-run projection of how many images a selection will produce.
//!
//! Shares the planner and expander with the render loop, so the number
//! shown before a run always equals the number of records the run emits.

use crate::{
    combine,
    model::{Selection, Snapshot},
    slots,
};

/// Counts at or above this prompt a confirmation before generating.
pub const GENERATION_WARN_AT: usize = 100;
/// Result lists at or above this prompt a confirmation before archiving.
pub const ZIP_WARN_AT: usize = 150;

/// Expected output count for a selection. A template with component slots
/// contributes its valid combination count; a slotless template counts
/// once. Templates with an image slot multiply by the number of selected
/// images, so zero selected images means zero output for them.
pub fn estimate(snapshot: &Snapshot, selection: &Selection) -> usize {
    if selection.template_ids.is_empty() {
        return 0;
    }
    let image_count = selection.image_ids.len();
    slots::plan_selected(snapshot, selection)
        .iter()
        .map(|plan| {
            let combos = combine::expand_valid(&plan.slots).len();
            let multiplier = if plan.wants_image { image_count } else { 1 };
            combos * multiplier
        })
        .sum()
}

pub fn warns_before_generation(count: usize) -> bool {
    count >= GENERATION_WARN_AT
}

pub fn warns_before_zip(result_len: usize) -> bool {
    result_len >= ZIP_WARN_AT
}
