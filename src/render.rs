//! The generation run: plan every selected template, prepare every bitmap
//! the run can touch, then composite one image per valid combination and
//! per selected background image.

use std::collections::HashSet;

use crate::{
    assets::{self, BitmapCache, BitmapSource},
    combine, count, encode,
    error::AdmillResult,
    model::{Component, DriveAsset, GeneratedImage, Layer, LayerKind, Selection, Snapshot, solid_paint},
    progress::{Phase, ProgressSink},
    raster::Surface,
    slots::{self, PlannedRole, TemplatePlan},
    text::{self, FontLibrary},
};

/// Per-run knobs.
#[derive(Clone, Copy, Debug)]
pub struct GenerateOpts {
    /// Overrides every template's canvas size when set.
    pub canvas_override: Option<(u32, u32)>,
    /// Yield the thread after this many loop iterations; 0 disables.
    pub yield_every: usize,
}

impl Default for GenerateOpts {
    fn default() -> Self {
        Self {
            canvas_override: None,
            yield_every: 20,
        }
    }
}

/// One-shot generation over an immutable snapshot. The result list
/// replaces any previous run's output wholesale.
pub struct Generator<'a> {
    snapshot: &'a Snapshot,
    source: &'a dyn BitmapSource,
    fonts: &'a FontLibrary,
    opts: GenerateOpts,
}

impl<'a> Generator<'a> {
    pub fn new(
        snapshot: &'a Snapshot,
        source: &'a dyn BitmapSource,
        fonts: &'a FontLibrary,
    ) -> Self {
        Self {
            snapshot,
            source,
            fonts,
            opts: GenerateOpts::default(),
        }
    }

    pub fn with_opts(mut self, opts: GenerateOpts) -> Self {
        self.opts = opts;
        self
    }

    /// Runs preparing then generating. A combination that fails to
    /// composite is logged and skipped; a bitmap that fails to load was
    /// already replaced by a placeholder. Neither aborts the run.
    #[tracing::instrument(skip_all)]
    pub fn execute(
        &self,
        selection: &Selection,
        sink: &mut dyn ProgressSink,
    ) -> AdmillResult<Vec<GeneratedImage>> {
        self.snapshot.validate()?;
        if selection.template_ids.is_empty() {
            return Ok(Vec::new());
        }

        let plans = slots::plan_selected(self.snapshot, selection);
        let selected_images: Vec<&DriveAsset> = self
            .snapshot
            .images
            .iter()
            .filter(|img| selection.image_ids.contains(&img.id))
            .collect();

        let urls = collect_bitmap_urls(&plans, &selected_images);
        let cache = assets::prepare_bitmaps(self.source, &urls, sink);

        let total = count::estimate(self.snapshot, selection);
        tracing::info!(
            templates = plans.len(),
            bitmaps = cache.len(),
            total,
            "starting generation"
        );

        let mut results = Vec::new();
        let mut iterations = 0usize;
        for plan in &plans {
            let combos = combine::expand_valid(&plan.slots);
            let image_loop: Vec<Option<&DriveAsset>> = if plan.wants_image {
                selected_images.iter().copied().map(Some).collect()
            } else {
                vec![None]
            };
            for image in &image_loop {
                for combination in &combos {
                    iterations += 1;
                    match self.render_one(plan, combination, *image, &cache) {
                        Ok(record) => {
                            results.push(record);
                            sink.progress(Phase::Generating, results.len(), total);
                        }
                        Err(err) => {
                            tracing::warn!(
                                template = %plan.template.name,
                                %err,
                                "combination failed to render, skipping"
                            );
                        }
                    }
                    if self.opts.yield_every > 0 && iterations.is_multiple_of(self.opts.yield_every)
                    {
                        std::thread::yield_now();
                    }
                }
            }
        }
        tracing::info!(emitted = results.len(), "generation finished");
        Ok(results)
    }

    fn render_one(
        &self,
        plan: &TemplatePlan<'_>,
        combination: &[&Component],
        image: Option<&DriveAsset>,
        cache: &BitmapCache,
    ) -> AdmillResult<GeneratedImage> {
        let template = plan.template;
        let (width, height) = match self.opts.canvas_override {
            Some(size) => size,
            None => (
                template.width.round().max(1.0) as u32,
                template.height.round().max(1.0) as u32,
            ),
        };
        let mut surface = Surface::new(width, height);
        let canvas = kurbo::Rect::new(0.0, 0.0, f64::from(width), f64::from(height));

        // Background: explicit color, else the frame's first visible solid
        // fill, else white.
        if let Some(bg) = template.background_color {
            surface.fill_rect(canvas, bg.to_rgba8_premul(1.0));
        } else if let Some((color, opacity)) = solid_paint(&template.fills) {
            surface.fill_rect(canvas, color.to_rgba8_premul(opacity));
        } else {
            surface.fill_rect(canvas, [255, 255, 255, 255]);
        }

        for (layer, role) in template.layers.iter().zip(&plan.roles) {
            match role {
                PlannedRole::Slot(idx) => {
                    draw_component(&mut surface, layer, Some(combination[*idx]), cache);
                }
                PlannedRole::Fixed(component) => {
                    draw_component(&mut surface, layer, *component, cache);
                }
                PlannedRole::ImageSlot => {
                    match image.and_then(|img| img.thumbnail_link.as_deref()) {
                        Some(link) => draw_cached(&mut surface, layer, link, cache),
                        // No pixel source at all: the layer keeps its own
                        // paint, like any static shape.
                        None => self.draw_static(&mut surface, layer, cache),
                    }
                }
                PlannedRole::Static => self.draw_static(&mut surface, layer, cache),
            }
        }

        let png = encode::surface_to_png(&surface)?;
        Ok(GeneratedImage {
            id: encode::fresh_record_id(),
            url: encode::png_data_url(&png),
            template_name: template.name.clone(),
            component_names: combination.iter().map(|c| c.name.clone()).collect(),
            folder: image.map(|img| {
                img.folder
                    .clone()
                    .filter(|f| !f.is_empty())
                    .unwrap_or_else(|| "Uncategorized".to_string())
            }),
            image_name: image.map(|img| img.name.clone()),
            timestamp: chrono::Utc::now(),
        })
    }

    fn draw_static(&self, surface: &mut Surface, layer: &Layer, cache: &BitmapCache) {
        if layer.kind == LayerKind::Text {
            text::draw_text(surface, self.fonts, layer);
            return;
        }
        if !layer.kind.is_shape() {
            return;
        }
        if let Some(url) = layer.fill_image_url.as_deref() {
            draw_cached(surface, layer, url, cache);
        } else if let Some((color, opacity)) = solid_paint(&layer.fills) {
            surface.fill_rect(layer.rect(), color.to_rgba8_premul(opacity));
        }
    }
}

/// An instance layer with no component or no thumbnail stays blank; it
/// never falls back to its own fills.
fn draw_component(
    surface: &mut Surface,
    layer: &Layer,
    component: Option<&Component>,
    cache: &BitmapCache,
) {
    let Some(url) = component.and_then(|c| c.thumbnail_url.as_deref()) else {
        return;
    };
    draw_cached(surface, layer, url, cache);
}

fn draw_cached(surface: &mut Surface, layer: &Layer, url: &str, cache: &BitmapCache) {
    let Some(bitmap) = cache.get(url) else {
        tracing::debug!(url, "bitmap missing from cache, skipping draw");
        return;
    };
    if bitmap.is_empty() {
        return;
    }
    surface.draw_bitmap_cover(bitmap.width, bitmap.height, &bitmap.rgba8_premul, layer.rect());
}

/// Every bitmap URL the render loop can touch, deduplicated in first-use
/// order: slot candidates, fixed instance components, shape fill images,
/// and the selected background images.
fn collect_bitmap_urls(plans: &[TemplatePlan<'_>], images: &[&DriveAsset]) -> Vec<String> {
    let mut urls = Vec::new();
    let mut seen = HashSet::new();
    let mut push = |url: &str| {
        if seen.insert(url.to_string()) {
            urls.push(url.to_string());
        }
    };

    for plan in plans {
        for (layer, role) in plan.template.layers.iter().zip(&plan.roles) {
            match role {
                PlannedRole::Slot(idx) => {
                    for component in &plan.slots[*idx] {
                        if let Some(url) = component.thumbnail_url.as_deref() {
                            push(url);
                        }
                    }
                }
                PlannedRole::Fixed(component) => {
                    if let Some(url) = component.and_then(|c| c.thumbnail_url.as_deref()) {
                        push(url);
                    }
                }
                PlannedRole::ImageSlot | PlannedRole::Static => {
                    if layer.kind.is_shape()
                        && let Some(url) = layer.fill_image_url.as_deref()
                    {
                        push(url);
                    }
                }
            }
        }
    }
    for image in images {
        if let Some(link) = image.thumbnail_link.as_deref() {
            push(link);
        }
    }
    urls
}
