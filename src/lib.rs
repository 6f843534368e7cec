#![forbid(unsafe_code)]

pub mod assets;
pub mod catalog;
pub mod color;
pub mod combine;
pub mod count;
pub mod encode;
pub mod error;
pub mod guide;
pub mod model;
pub mod naming;
pub mod progress;
pub mod raster;
pub mod render;
pub mod slots;
pub mod text;

pub use assets::{BitmapCache, BitmapSource, PreparedBitmap};
pub use catalog::ComponentCatalog;
pub use color::ColorRecord;
pub use error::{AdmillError, AdmillResult};
pub use model::{
    Component, DriveAsset, Fill, GeneratedImage, HorizontalAlign, Layer, LayerKind, Selection,
    Snapshot, Template, VerticalAlign,
};
pub use progress::{NullProgress, Phase, ProgressSink};
pub use render::{GenerateOpts, Generator};
pub use slots::{PlannedRole, TemplatePlan};
pub use text::FontLibrary;
