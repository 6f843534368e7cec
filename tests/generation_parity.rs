use std::collections::{HashMap, HashSet};
use std::io::Cursor;

use admill::{
    AdmillError, AdmillResult, BitmapSource, ColorRecord, Component, DriveAsset, Fill,
    FontLibrary, Generator, Layer, LayerKind, NullProgress, Phase, Selection, Snapshot, Template,
    count, model,
    progress::CollectProgress,
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

fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn decode_data_url(url: &str) -> image::RgbaImage {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    let b64 = url.strip_prefix("data:image/png;base64,").unwrap();
    let png = STANDARD.decode(b64).unwrap();
    image::load_from_memory(&png).unwrap().to_rgba8()
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

fn layer(name: &str, kind: LayerKind) -> Layer {
    Layer {
        id: format!("layer-{name}"),
        name: name.to_string(),
        kind,
        x: 0.0,
        y: 0.0,
        width: 100.0,
        height: 50.0,
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

fn instance(name: &str) -> Layer {
    layer(name, LayerKind::Instance)
}

fn template(id: &str, name: &str, layers: Vec<Layer>) -> Template {
    Template {
        id: id.to_string(),
        name: name.to_string(),
        width: 200.0,
        height: 200.0,
        layers,
        fills: vec![],
        background_color: None,
    }
}

fn select<const N: usize>(ids: [&str; N]) -> HashSet<String> {
    ids.into_iter().map(str::to_string).collect()
}

/// A square promo with offer/disclaimer/logo slots plus a hero image, and
/// a slotless story card. Offers and disclaimers pair up by price.
fn retail_snapshot() -> Snapshot {
    Snapshot {
        templates: vec![
            template(
                "promo",
                "Template_Square",
                vec![
                    instance("Offer"),
                    instance("Disclaimer"),
                    layer("Hero", LayerKind::Rectangle),
                    instance("Logo"),
                ],
            ),
            template("plain", "Template_Story", vec![layer("Caption", LayerKind::Text)]),
        ],
        components: vec![
            component("o1", "Property 1=9.99", Some("Offer")),
            component("o2", "Property 2=19.99", Some("Offer")),
            component("d1", "Property 1=9.99", Some("Disclaimer")),
            component("d2", "Property 2=19.99", Some("Disclaimer")),
            component("logo", "Logo", None),
        ],
        images: vec![
            DriveAsset {
                id: "i1".to_string(),
                name: "beach.jpg".to_string(),
                thumbnail_link: Some("mem://beach".to_string()),
                folder: Some("Summer".to_string()),
                size: None,
            },
            DriveAsset {
                id: "i2".to_string(),
                name: "city.jpg".to_string(),
                thumbnail_link: Some("mem://city".to_string()),
                folder: None,
                size: None,
            },
        ],
    }
}

fn retail_source() -> MapSource {
    let mut map = HashMap::new();
    for (url, rgba) in [
        ("mem://o1", [0, 255, 0, 255]),
        ("mem://o2", [255, 255, 0, 255]),
        ("mem://d1", [0, 0, 255, 255]),
        ("mem://d2", [255, 0, 255, 255]),
        ("mem://logo", [255, 128, 0, 255]),
        ("mem://beach", [255, 0, 0, 255]),
        ("mem://city", [0, 255, 255, 255]),
    ] {
        map.insert(url.to_string(), png_bytes(2, 2, rgba));
    }
    MapSource(map)
}

fn full_selection() -> Selection {
    Selection {
        template_ids: select(["promo", "plain"]),
        component_ids: HashSet::new(),
        image_ids: select(["i1", "i2"]),
    }
}

#[test]
fn emitted_records_always_match_the_estimate() {
    let snapshot = retail_snapshot();
    let source = retail_source();
    let fonts = FontLibrary::empty();
    let generator = Generator::new(&snapshot, &source, &fonts);

    let selections = [
        full_selection(),
        Selection {
            template_ids: select(["promo", "plain"]),
            component_ids: select(["o2", "d1"]),
            image_ids: select(["i1", "i2"]),
        },
        Selection {
            template_ids: select(["promo", "plain"]),
            ..Default::default()
        },
        Selection::default(),
    ];

    for selection in selections {
        let expected = count::estimate(&snapshot, &selection);
        let results = generator.execute(&selection, &mut NullProgress).unwrap();
        assert_eq!(results.len(), expected);
    }
}

#[test]
fn records_carry_component_names_in_slot_order() {
    let snapshot = retail_snapshot();
    let source = retail_source();
    let fonts = FontLibrary::empty();
    let generator = Generator::new(&snapshot, &source, &fonts);

    let results = generator.execute(&full_selection(), &mut NullProgress).unwrap();
    // Two price-matched pairs x two images, then the story card.
    assert_eq!(results.len(), 5);

    for record in &results[..4] {
        assert_eq!(record.template_name, "Template_Square");
        assert_eq!(record.component_names.len(), 3);
        // Offer and disclaimer always share a price.
        assert_eq!(record.component_names[0], record.component_names[1]);
        assert_eq!(record.component_names[2], "Logo");
    }
    assert_eq!(results[0].component_names[0], "Property 1=9.99");
    assert_eq!(results[1].component_names[0], "Property 2=19.99");

    assert_eq!(results[4].template_name, "Template_Story");
    assert!(results[4].component_names.is_empty());
}

#[test]
fn selected_offers_pair_with_every_selected_image() {
    let snapshot = Snapshot {
        templates: vec![template(
            "promo",
            "Template_Square",
            vec![instance("Offer"), layer("Hero", LayerKind::Rectangle)],
        )],
        components: vec![
            component("o1", "Property 1=9.99", Some("Offer")),
            component("o2", "Property 2=19.99", Some("Offer")),
            component("o3", "Property 3=29.99", Some("Offer")),
        ],
        images: retail_snapshot().images,
    };
    let mut map = HashMap::new();
    for id in ["o1", "o2", "beach", "city"] {
        map.insert(format!("mem://{id}"), png_bytes(2, 2, [40, 40, 40, 255]));
    }
    let source = MapSource(map);
    let fonts = FontLibrary::empty();
    let generator = Generator::new(&snapshot, &source, &fonts);
    let selection = Selection {
        template_ids: select(["promo"]),
        component_ids: select(["o1", "o2"]),
        image_ids: select(["i1", "i2"]),
    };

    assert_eq!(count::estimate(&snapshot, &selection), 4);
    let results = generator.execute(&selection, &mut NullProgress).unwrap();
    assert_eq!(results.len(), 4);

    let pairings: HashSet<(String, String)> = results
        .iter()
        .map(|r| {
            (
                r.component_names[0].clone(),
                r.image_name.clone().unwrap(),
            )
        })
        .collect();
    assert_eq!(pairings.len(), 4);
    assert!(pairings.iter().all(|(offer, _)| !offer.contains("29.99")));
}

#[test]
fn hero_templates_stamp_image_provenance() {
    let snapshot = retail_snapshot();
    let source = retail_source();
    let fonts = FontLibrary::empty();
    let generator = Generator::new(&snapshot, &source, &fonts);

    let results = generator.execute(&full_selection(), &mut NullProgress).unwrap();

    assert_eq!(results[0].image_name.as_deref(), Some("beach.jpg"));
    assert_eq!(results[0].folder.as_deref(), Some("Summer"));
    assert_eq!(results[2].image_name.as_deref(), Some("city.jpg"));
    // Folderless images group under a stable bucket.
    assert_eq!(results[2].folder.as_deref(), Some("Uncategorized"));

    // The story card uses no image at all.
    assert!(results[4].image_name.is_none());
    assert!(results[4].folder.is_none());
}

#[test]
fn data_urls_decode_back_to_the_canvas() {
    let mut fill_layer = layer("Panel", LayerKind::Rectangle);
    fill_layer.width = 2.0;
    fill_layer.height = 2.0;
    fill_layer.fills = vec![Fill {
        kind: "SOLID".to_string(),
        visible: None,
        color: Some(ColorRecord::rgba(1.0, 1.0, 1.0, 1.0)),
        opacity: None,
    }];
    let snapshot = Snapshot {
        templates: vec![Template {
            id: "t".to_string(),
            name: "Tiny".to_string(),
            width: 4.0,
            height: 4.0,
            layers: vec![fill_layer],
            fills: vec![],
            background_color: Some(ColorRecord::rgba(1.0, 0.0, 0.0, 1.0)),
        }],
        components: vec![],
        images: vec![],
    };
    let source = MapSource(HashMap::new());
    let fonts = FontLibrary::empty();
    let generator = Generator::new(&snapshot, &source, &fonts);
    let selection = Selection {
        template_ids: select(["t"]),
        ..Default::default()
    };

    let results = generator.execute(&selection, &mut NullProgress).unwrap();
    assert_eq!(results.len(), 1);

    let decoded = decode_data_url(&results[0].url);
    assert_eq!(decoded.dimensions(), (4, 4));
    assert_eq!(decoded.get_pixel(0, 0).0, [255, 255, 255, 255]);
    assert_eq!(decoded.get_pixel(1, 1).0, [255, 255, 255, 255]);
    assert_eq!(decoded.get_pixel(2, 2).0, [255, 0, 0, 255]);
    assert_eq!(decoded.get_pixel(3, 0).0, [255, 0, 0, 255]);
}

#[test]
fn component_bitmaps_cover_their_layer_box() {
    let mut slot = instance("Promo");
    slot.width = 4.0;
    slot.height = 4.0;
    let snapshot = Snapshot {
        templates: vec![Template {
            id: "t".to_string(),
            name: "Tiny".to_string(),
            width: 4.0,
            height: 4.0,
            layers: vec![slot],
            fills: vec![],
            background_color: None,
        }],
        components: vec![component("p", "Promo", None)],
        images: vec![],
    };
    let source = MapSource(HashMap::from([(
        "mem://p".to_string(),
        png_bytes(2, 2, [0, 255, 0, 255]),
    )]));
    let fonts = FontLibrary::empty();
    let generator = Generator::new(&snapshot, &source, &fonts);
    let selection = Selection {
        template_ids: select(["t"]),
        ..Default::default()
    };

    let results = generator.execute(&selection, &mut NullProgress).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].component_names, ["Promo"]);

    let decoded = decode_data_url(&results[0].url);
    for (_, _, px) in decoded.enumerate_pixels() {
        assert_eq!(px.0, [0, 255, 0, 255]);
    }
}

#[test]
fn missing_bitmaps_leave_the_layer_blank_but_emit_the_record() {
    let snapshot = Snapshot {
        templates: vec![Template {
            id: "t".to_string(),
            name: "Tiny".to_string(),
            width: 4.0,
            height: 4.0,
            layers: vec![instance("Promo")],
            fills: vec![],
            background_color: None,
        }],
        components: vec![component("p", "Promo", None)],
        images: vec![],
    };
    // The component's thumbnail URL resolves to nothing.
    let source = MapSource(HashMap::new());
    let fonts = FontLibrary::empty();
    let generator = Generator::new(&snapshot, &source, &fonts);
    let selection = Selection {
        template_ids: select(["t"]),
        ..Default::default()
    };

    let results = generator.execute(&selection, &mut NullProgress).unwrap();
    assert_eq!(results.len(), 1);

    // Default white background shows through the skipped draw.
    let decoded = decode_data_url(&results[0].url);
    for (_, _, px) in decoded.enumerate_pixels() {
        assert_eq!(px.0, [255, 255, 255, 255]);
    }
}

#[test]
fn progress_reports_preparing_then_generating() {
    let snapshot = retail_snapshot();
    let source = retail_source();
    let fonts = FontLibrary::empty();
    let generator = Generator::new(&snapshot, &source, &fonts);

    let mut sink = CollectProgress::default();
    let results = generator.execute(&full_selection(), &mut sink).unwrap();
    let expected = count::estimate(&snapshot, &full_selection());

    let first_generating = sink
        .events
        .iter()
        .position(|(phase, _, _)| *phase == Phase::Generating)
        .unwrap();
    assert!(
        sink.events[..first_generating]
            .iter()
            .all(|(phase, _, _)| *phase == Phase::Preparing)
    );

    let preparing: Vec<_> = sink
        .events
        .iter()
        .filter(|(phase, _, _)| *phase == Phase::Preparing)
        .collect();
    assert!(!preparing.is_empty());
    let url_total = preparing[0].2;
    for (tick, (_, current, total)) in preparing.iter().enumerate() {
        assert_eq!(*current, tick + 1);
        assert_eq!(*total, url_total);
    }
    assert_eq!(preparing.len(), url_total);

    let generating: Vec<_> = sink
        .events
        .iter()
        .filter(|(phase, _, _)| *phase == Phase::Generating)
        .collect();
    assert_eq!(generating.len(), results.len());
    for (tick, (_, current, total)) in generating.iter().enumerate() {
        assert_eq!(*current, tick + 1);
        assert_eq!(*total, expected);
    }
}

#[test]
fn reruns_are_pixel_identical_with_fresh_ids() {
    let snapshot = retail_snapshot();
    let source = retail_source();
    let fonts = FontLibrary::empty();
    let generator = Generator::new(&snapshot, &source, &fonts);

    let first = generator.execute(&full_selection(), &mut NullProgress).unwrap();
    let second = generator.execute(&full_selection(), &mut NullProgress).unwrap();

    let urls = |records: &[model::GeneratedImage]| -> Vec<String> {
        records.iter().map(|r| r.url.clone()).collect()
    };
    assert_eq!(urls(&first), urls(&second));

    let first_ids: HashSet<_> = first.iter().map(|r| r.id.clone()).collect();
    assert_eq!(first_ids.len(), first.len());
    assert!(second.iter().all(|r| !first_ids.contains(&r.id)));
}

#[test]
fn removing_a_record_leaves_the_rest() {
    let snapshot = retail_snapshot();
    let source = retail_source();
    let fonts = FontLibrary::empty();
    let generator = Generator::new(&snapshot, &source, &fonts);

    let mut results = generator.execute(&full_selection(), &mut NullProgress).unwrap();
    let victim = results[2].id.clone();

    assert!(model::remove_record(&mut results, &victim));
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r.id != victim));
    assert!(!model::remove_record(&mut results, "not-a-record"));
}
