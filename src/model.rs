use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    color::ColorRecord,
    error::{AdmillError, AdmillResult},
};

/// One swappable design element variant from the synced component library.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: String,
    pub name: String,
    /// Components sharing a set name are mutually-exclusive alternatives
    /// for the same slot; `None` marks a singleton.
    #[serde(default)]
    pub component_set_name: Option<String>,
    /// Bitmap rendering of this variant; also the pixel source composited
    /// into generated output.
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

/// A rendering target: a fixed-size canvas with ordered layers. Layer order
/// is paint order (later layers paint over earlier ones).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub fills: Vec<Fill>,
    #[serde(default)]
    pub background_color: Option<ColorRecord>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayerKind {
    Component,
    Instance,
    Text,
    Rectangle,
    Frame,
    Group,
    Vector,
    #[serde(other)]
    Unknown,
}

impl LayerKind {
    /// Kinds that mark a layer as a component instance even without a
    /// catalog match.
    pub fn is_instance(self) -> bool {
        matches!(self, Self::Instance | Self::Component)
    }

    pub fn is_shape(self) -> bool {
        matches!(self, Self::Rectangle | Self::Frame | Self::Group | Self::Vector)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HorizontalAlign {
    Center,
    Right,
    #[default]
    #[serde(other)]
    Left,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerticalAlign {
    Center,
    Bottom,
    #[default]
    #[serde(other)]
    Top,
}

/// One positioned element inside a template, with an absolute pixel box.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub opacity: Option<f64>,
    #[serde(default)]
    pub fills: Vec<Fill>,
    /// Direct reference to the master component, when the manifest has one.
    #[serde(default)]
    pub component_id: Option<String>,
    #[serde(default)]
    pub characters: Option<String>,
    #[serde(default)]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub font_weight: Option<u16>,
    #[serde(default)]
    pub text_align_horizontal: HorizontalAlign,
    #[serde(default)]
    pub text_align_vertical: VerticalAlign,
    /// Direct bitmap fill for non-component shape layers.
    #[serde(default)]
    pub fill_image_url: Option<String>,
}

impl Layer {
    pub fn rect(&self) -> kurbo::Rect {
        kurbo::Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

/// One paint fill on a layer or template frame.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fill {
    #[serde(rename = "type")]
    pub kind: String,
    /// Absent means visible.
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub color: Option<ColorRecord>,
    #[serde(default)]
    pub opacity: Option<f64>,
}

/// First visible solid fill wins; a colorless solid fill yields nothing
/// rather than falling through to later fills.
pub fn solid_paint(fills: &[Fill]) -> Option<(ColorRecord, f64)> {
    let fill = fills
        .iter()
        .find(|f| f.visible != Some(false) && f.kind == "SOLID")?;
    let color = fill.color?;
    Some((color, fill.opacity.unwrap_or(1.0)))
}

/// A background image from the synced asset pool.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveAsset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub thumbnail_link: Option<String>,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

/// One rendered output. Immutable once emitted; individually removable
/// from the result list without affecting other records.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub id: String,
    /// Self-contained `data:image/png;base64,...` URL.
    pub url: String,
    pub template_name: String,
    /// Every component variant used in this render, in slot order.
    pub component_names: Vec<String>,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub image_name: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Deletes one record in place. Returns whether anything was removed.
pub fn remove_record(records: &mut Vec<GeneratedImage>, id: &str) -> bool {
    let before = records.len();
    records.retain(|r| r.id != id);
    records.len() != before
}

/// The caller's selection state, passed read-only into every count and
/// generate call.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Selection {
    pub template_ids: HashSet<String>,
    pub component_ids: HashSet<String>,
    pub image_ids: HashSet<String>,
}

/// An immutable per-call snapshot of the synced data.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub templates: Vec<Template>,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub images: Vec<DriveAsset>,
}

impl Snapshot {
    pub fn validate(&self) -> AdmillResult<()> {
        let mut template_ids = HashSet::new();
        for template in &self.templates {
            if template.id.is_empty() {
                return Err(AdmillError::validation("template id must be non-empty"));
            }
            if !template_ids.insert(template.id.as_str()) {
                return Err(AdmillError::validation(format!(
                    "duplicate template id '{}'",
                    template.id
                )));
            }
            if template.width <= 0.0 || template.height <= 0.0 {
                return Err(AdmillError::validation(format!(
                    "template '{}' canvas size must be > 0",
                    template.id
                )));
            }
            for layer in &template.layers {
                if layer.width < 0.0 || layer.height < 0.0 {
                    return Err(AdmillError::validation(format!(
                        "layer '{}' in template '{}' has a negative box",
                        layer.id, template.id
                    )));
                }
            }
        }

        let mut component_ids = HashSet::new();
        for component in &self.components {
            if component.id.is_empty() {
                return Err(AdmillError::validation("component id must be non-empty"));
            }
            if !component_ids.insert(component.id.as_str()) {
                return Err(AdmillError::validation(format!(
                    "duplicate component id '{}'",
                    component.id
                )));
            }
        }

        let mut image_ids = HashSet::new();
        for image in &self.images {
            if !image_ids.insert(image.id.as_str()) {
                return Err(AdmillError::validation(format!(
                    "duplicate image id '{}'",
                    image.id
                )));
            }
        }

        Ok(())
    }
}
