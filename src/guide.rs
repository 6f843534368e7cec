//! # Admill guide (v0.1.0)
//!
//! This module is a standalone, end-to-end walkthrough of Admill’s architecture and public API.
//! It is intentionally detailed so future phases (and external integrations) can build on a shared
//! mental model of what “a generation run” means in this codebase.
//!
//! If you are looking for copy/paste commands, start with the repository `README.md`.
//! If you are implementing new features, start here.
//!
//! ---
//!
//! ## Core concepts
//!
//! - [`Snapshot`](crate::Snapshot): the immutable inputs of one run (templates + components + images)
//! - [`Selection`](crate::Selection): which templates, component variants, and background images to use
//! - [`ComponentCatalog`](crate::ComponentCatalog): indexed lookup from layer names to library components
//! - [`TemplatePlan`](crate::TemplatePlan): one selected template with every layer classified and
//!   every slot’s candidate list resolved
//! - [`Generator`](crate::Generator): expands plans into combinations and composites each one
//! - [`GeneratedImage`](crate::GeneratedImage): one emitted record (a self-contained PNG data URL)
//! - [`BitmapSource`](crate::BitmapSource): the only place external IO is allowed
//! - [`FontLibrary`](crate::FontLibrary): caller-registered font bytes for text layers
//!
//! The generation pipeline is explicitly staged:
//!
//! 1. Plan selected templates: [`plan_selected`](crate::slots::plan_selected)
//! 2. Expand slots into valid combinations: [`expand_valid`](crate::combine::expand_valid)
//! 3. Prepare every reachable bitmap: [`prepare_bitmaps`](crate::assets::prepare_bitmaps)
//! 4. Composite and emit records: [`Generator::execute`](crate::Generator::execute)
//!
//! [`Generator::execute`](crate::Generator::execute) is the convenience wrapper for all four.
//! Counting without rendering is [`estimate`](crate::count::estimate); it walks the same plans, so
//! the estimate and the emitted record count can never disagree.
//!
//! ---
//!
//! ## “No IO in the engine” (and why)
//!
//! Admill wants planning/expansion/compositing to be deterministic, testable, and portable.
//! To do that, engine code never reaches into the filesystem (or network).
//! Instead:
//!
//! - IO happens through [`BitmapSource`](crate::BitmapSource), fetch plus an optional fallback
//!   (typically a caching proxy in front of a CDN)
//! - the engine consumes **prepared** bitmaps:
//!   - [`PreparedBitmap`](crate::PreparedBitmap) (premultiplied RGBA8)
//! - preparation happens up front, in parallel, into a [`BitmapCache`](crate::BitmapCache); the
//!   composite loop only ever does cache lookups
//!
//! A bitmap whose fetch and fallback both fail is cached as an empty placeholder: the run keeps
//! going and the affected layer simply paints nothing. Generation never aborts because one CDN
//! URL rotted.
//!
//! This design makes it straightforward to add a future source that loads from:
//! - an in-memory store (tests do exactly this)
//! - a local thumbnail cache
//! - a remote object store
//! without changing engine logic.
//!
//! ---
//!
//! ## Premultiplied alpha (Admill’s pixel contract)
//!
//! Admill’s internal pixel convention is **premultiplied RGBA8**:
//!
//! - decoded bitmaps are premultiplied at ingest
//! - [`Surface`](crate::raster::Surface) compositing assumes premultiplied alpha
//! - PNG encoding un-premultiplies at the very end, in
//!   [`surface_to_png`](crate::encode::surface_to_png)
//!
//! If you integrate Admill with external compositors, this is the most important contract to
//! preserve. Treat `Surface::data` as premultiplied unless explicitly stated otherwise by the API.
//!
//! ---
//!
//! ## Slot resolution: from layer names to candidate lists
//!
//! Each template layer is classified exactly once per run
//! ([`PlannedRole`](crate::PlannedRole)):
//!
//! - a **hero name** marks the background-image slot, regardless of the layer’s declared type;
//!   such a template is rendered once per selected image
//! - an instance layer resolves to its library component (by id, cleaned name, raw name, then
//!   fuzzy prefix/set matching) and from there to a candidate list:
//!   - sets whose name contains `Offer` always source from the base `Offer` set (the selected
//!     subset, or all of it); wide templates then remap each source to the same-priced member of
//!     a wide offer set, dropping sources with no wide twin
//!   - sets whose name contains `Disclaimer` contribute **every** member, never user-filtered,
//!     so the cross-slot filter can pair each disclaimer with its matching offer
//!   - any other set contributes its selected members, or just the resolved original when
//!     nothing from the set is selected
//! - an instance layer whose candidate list comes back empty is **fixed**: painted with its one
//!   resolved component (or nothing) in every output
//! - everything else is **static**: text and shapes painted from the layer’s own data
//!
//! ---
//!
//! ## Combinations and the cross-slot filter
//!
//! Slots multiply: the combination set is the cartesian product of the candidate lists, in layer
//! order, with candidates in library order. A template with no slots still renders exactly once.
//!
//! One rule prunes the product: if a combination contains both an offer and a disclaimer variant,
//! and both names carry a price-like variant key, the keys must match. `$9.99` artwork never
//! ships with `$19.99` fine print. Combinations where either side has no extractable key are
//! kept.
//!
//! The same filtered expansion backs [`estimate`](crate::count::estimate), which the caller is
//! expected to show **before** generating;
//! [`warns_before_generation`](crate::count::warns_before_generation) and
//! [`warns_before_zip`](crate::count::warns_before_zip) are the confirmation thresholds.
//!
//! ---
//!
//! ## Running a generation
//!
//! The following example builds a minimal snapshot containing a single slotless template (no
//! external IO needed), then generates its one output.
//!
//! ```rust,no_run
//! use std::collections::HashSet;
//!
//! use admill::{
//!     AdmillError, AdmillResult, BitmapSource, FontLibrary, Generator, NullProgress, Selection,
//!     Snapshot, Template,
//! };
//!
//! struct Offline;
//!
//! impl BitmapSource for Offline {
//!     fn fetch(&self, url: &str) -> AdmillResult<Vec<u8>> {
//!         Err(AdmillError::decode(format!("offline source asked for {url}")))
//!     }
//! }
//!
//! # fn main() -> admill::AdmillResult<()> {
//! let snapshot = Snapshot {
//!     templates: vec![Template {
//!         id: "square".to_string(),
//!         name: "Template_Square".to_string(),
//!         width: 1080.0,
//!         height: 1080.0,
//!         layers: vec![],
//!         fills: vec![],
//!         background_color: None,
//!     }],
//!     components: vec![],
//!     images: vec![],
//! };
//! let selection = Selection {
//!     template_ids: HashSet::from(["square".to_string()]),
//!     ..Selection::default()
//! };
//!
//! let fonts = FontLibrary::empty();
//! let generator = Generator::new(&snapshot, &Offline, &fonts);
//! let results = generator.execute(&selection, &mut NullProgress)?;
//! assert_eq!(results.len(), 1);
//! assert!(results[0].url.starts_with("data:image/png;base64,"));
//! # Ok(())
//! # }
//! ```
//!
//! Notes:
//!
//! - [`Snapshot::validate`](crate::Snapshot::validate) is called by
//!   [`Generator::execute`](crate::Generator::execute); malformed manifests are rejected before
//!   any pixel work.
//! - A combination that fails to composite is logged and skipped; the run continues.
//!
//! ---
//!
//! ## Text layers and fonts
//!
//! Admill does not bundle or discover fonts. Text layers rasterize through `fontdue` with bytes
//! the caller registers on a [`FontLibrary`](crate::FontLibrary):
//!
//! - [`FontLibrary::register`](crate::FontLibrary::register) keys fonts by (family, weight);
//!   lookup falls back to the nearest weight in the family, then to the default font
//! - with an empty library, text layers are skipped (logged at debug); everything else still
//!   renders
//!
//! Alignment follows the layer box: horizontal alignment uses the measured advance width,
//! vertical alignment picks the baseline from the font size and descent.
//!
//! ---
//!
//! ## Output records
//!
//! Every emitted [`GeneratedImage`](crate::GeneratedImage) is self-contained:
//!
//! - `url` is a `data:image/png;base64,...` URL; no files are written
//! - `id` is a fresh UUID, so records can be removed individually
//!   ([`remove_record`](crate::model::remove_record)) without disturbing the rest
//! - `component_names` lists the variants used, in slot order; `folder` and `image_name`
//!   identify the background image for hero templates (folderless images group under
//!   `Uncategorized`)
//!
//! A run’s result list replaces the previous one wholesale; records are never mutated after
//! emission.
