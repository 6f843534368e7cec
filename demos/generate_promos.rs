use std::collections::{HashMap, HashSet};
use std::io::Cursor;

use admill::{
    AdmillError, AdmillResult, BitmapSource, ColorRecord, Component, DriveAsset, FontLibrary,
    Generator, Layer, LayerKind, Phase, ProgressSink, Selection, Snapshot, Template, count, naming,
};

struct MapSource(HashMap<String, Vec<u8>>);

impl BitmapSource for MapSource {
    fn fetch(&self, url: &str) -> AdmillResult<Vec<u8>> {
        self.0
            .get(url)
            .cloned()
            .ok_or_else(|| AdmillError::decode(format!("no bitmap for {url}")))
    }
}

struct PrintProgress;

impl ProgressSink for PrintProgress {
    fn progress(&mut self, phase: Phase, current: usize, total: usize) {
        let verb = match phase {
            Phase::Preparing => "prepared",
            Phase::Generating => "generated",
        };
        println!("{verb} {current}/{total}");
    }
}

fn png_bytes(rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn component(id: &str, name: &str, set: Option<&str>) -> Component {
    Component {
        id: id.to_string(),
        name: name.to_string(),
        component_set_name: set.map(str::to_string),
        thumbnail_url: Some(format!("mem://{id}")),
        width: None,
        height: None,
    }
}

fn instance(name: &str, x: f64, y: f64, width: f64, height: f64) -> Layer {
    Layer {
        id: format!("layer-{name}"),
        name: name.to_string(),
        kind: LayerKind::Instance,
        x,
        y,
        width,
        height,
        opacity: None,
        fills: vec![],
        component_id: None,
        characters: None,
        font_size: None,
        font_family: None,
        font_weight: None,
        text_align_horizontal: Default::default(),
        text_align_vertical: Default::default(),
        fill_image_url: None,
    }
}

fn ids<const N: usize>(values: [&str; N]) -> HashSet<String> {
    values.into_iter().map(str::to_string).collect()
}

/// A square promo (hero image, price offer, matching disclaimer, logo)
/// plus a slotless story card that renders exactly once.
fn promo_snapshot() -> Snapshot {
    let mut hero = instance("Hero", 0.0, 0.0, 400.0, 400.0);
    hero.kind = LayerKind::Rectangle;

    Snapshot {
        templates: vec![
            Template {
                id: "square".to_string(),
                name: "Promo_Square".to_string(),
                width: 400.0,
                height: 400.0,
                layers: vec![
                    hero,
                    instance("Offer", 40.0, 250.0, 320.0, 90.0),
                    instance("Disclaimer", 40.0, 350.0, 320.0, 30.0),
                    instance("Logo", 20.0, 20.0, 120.0, 60.0),
                ],
                fills: vec![],
                background_color: None,
            },
            Template {
                id: "story".to_string(),
                name: "Promo_Story".to_string(),
                width: 270.0,
                height: 480.0,
                layers: vec![],
                fills: vec![],
                background_color: Some(ColorRecord {
                    r: 0.07,
                    g: 0.09,
                    b: 0.32,
                    a: 1.0,
                }),
            },
        ],
        components: vec![
            component("offer-999", "Property 1=9.99", Some("Offer")),
            component("offer-1999", "Property 2=19.99", Some("Offer")),
            component("disc-999", "Property 1=9.99", Some("Disclaimer")),
            component("disc-1999", "Property 2=19.99", Some("Disclaimer")),
            component("logo", "Logo", None),
        ],
        images: vec![
            DriveAsset {
                id: "beach".to_string(),
                name: "beach.jpg".to_string(),
                thumbnail_link: Some("mem://beach".to_string()),
                folder: Some("Summer".to_string()),
                size: None,
            },
            DriveAsset {
                id: "city".to_string(),
                name: "city.jpg".to_string(),
                thumbnail_link: Some("mem://city".to_string()),
                folder: None,
                size: None,
            },
        ],
    }
}

fn promo_source() -> MapSource {
    let mut map = HashMap::new();
    for (id, rgba) in [
        ("offer-999", [255, 214, 0, 255]),
        ("offer-1999", [255, 120, 0, 255]),
        ("disc-999", [230, 230, 230, 255]),
        ("disc-1999", [200, 200, 200, 255]),
        ("logo", [20, 20, 20, 255]),
        ("beach", [64, 160, 255, 255]),
        ("city", [96, 96, 112, 255]),
    ] {
        map.insert(format!("mem://{id}"), png_bytes(rgba));
    }
    MapSource(map)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let snapshot = promo_snapshot();
    let source = promo_source();
    let fonts = FontLibrary::empty();

    // Only the 9.99 offer is selected; the cross-slot filter then keeps
    // just the 9.99 disclaimer, so the square yields one combination per
    // background image.
    let selection = Selection {
        template_ids: ids(["square", "story"]),
        component_ids: ids(["offer-999"]),
        image_ids: ids(["beach", "city"]),
    };

    let expected = count::estimate(&snapshot, &selection);
    println!("estimate: {expected} records");

    let generator = Generator::new(&snapshot, &source, &fonts);
    let records = generator.execute(&selection, &mut PrintProgress)?;

    for record in &records {
        let filename = naming::export_filename(
            &record.template_name,
            &record.component_names,
            record.image_name.as_deref(),
        );
        println!(
            "{filename}  [{}]  folder={}  {} bytes",
            record.component_names.join(" + "),
            record.folder.as_deref().unwrap_or("-"),
            record.url.len(),
        );
    }

    Ok(())
}
