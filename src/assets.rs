//! Bitmap sourcing: fetch, decode, and cache every pixel source a run
//! needs before any compositing starts.

use std::{
    collections::HashMap,
    sync::{Arc, mpsc},
};

use anyhow::Context;
use rayon::prelude::*;

use crate::{
    error::AdmillResult,
    progress::{Phase, ProgressSink},
};

#[derive(Clone, Debug)]
pub struct PreparedBitmap {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedBitmap {
    /// Zero-dimension stand-in for a bitmap that failed to load; draws
    /// nothing when composited.
    pub fn placeholder() -> Self {
        Self {
            width: 0,
            height: 0,
            rgba8_premul: Arc::new(Vec::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Byte-level access to bitmap URLs. Implementations own transport
/// details (HTTP, disk, in-memory fixtures); the engine never touches a
/// network itself.
pub trait BitmapSource: Send + Sync {
    fn fetch(&self, url: &str) -> AdmillResult<Vec<u8>>;

    /// Second-chance retrieval after `fetch` fails, for sources with an
    /// alternate route to the same pixels. Defaults to one plain retry.
    fn fetch_fallback(&self, url: &str) -> AdmillResult<Vec<u8>> {
        self.fetch(url)
    }
}

pub fn decode_bitmap(bytes: &[u8]) -> AdmillResult<PreparedBitmap> {
    let dyn_img = image::load_from_memory(bytes).context("decode bitmap from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedBitmap {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

/// URL-keyed cache of decoded bitmaps. Write-once per key: redundant
/// loads of the same URL are discarded.
#[derive(Default)]
pub struct BitmapCache {
    map: HashMap<String, PreparedBitmap>,
}

impl BitmapCache {
    pub fn get(&self, url: &str) -> Option<&PreparedBitmap> {
        self.map.get(url)
    }

    pub fn insert(&mut self, url: String, bitmap: PreparedBitmap) {
        self.map.entry(url).or_insert(bitmap);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Fetches and decodes every URL exactly once, fanned out across the
/// rayon pool, reporting one `Preparing` tick per completion. A load
/// failure retries once through `fetch_fallback`; a second failure maps
/// the URL to the empty placeholder instead of aborting the run.
pub fn prepare_bitmaps(
    source: &dyn BitmapSource,
    urls: &[String],
    sink: &mut dyn ProgressSink,
) -> BitmapCache {
    let mut cache = BitmapCache::default();
    if urls.is_empty() {
        return cache;
    }

    let total = urls.len();
    let (tx, rx) = mpsc::channel::<(usize, PreparedBitmap)>();

    // Collector thread: sole writer for the cache and the sink while the
    // pool fans out fetch and decode.
    std::thread::scope(|scope| {
        let cache_ref = &mut cache;
        scope.spawn(move || {
            let mut done = 0;
            for (idx, bitmap) in rx {
                done += 1;
                cache_ref.insert(urls[idx].clone(), bitmap);
                sink.progress(Phase::Preparing, done, total);
            }
        });

        urls.par_iter()
            .enumerate()
            .for_each_with(tx, |tx, (idx, url)| {
                let _ = tx.send((idx, load_one(source, url)));
            });
    });
    cache
}

fn load_one(source: &dyn BitmapSource, url: &str) -> PreparedBitmap {
    match source.fetch(url).and_then(|bytes| decode_bitmap(&bytes)) {
        Ok(bitmap) => bitmap,
        Err(primary) => {
            match source
                .fetch_fallback(url)
                .and_then(|bytes| decode_bitmap(&bytes))
            {
                Ok(bitmap) => bitmap,
                Err(fallback) => {
                    tracing::warn!(
                        url,
                        %primary,
                        %fallback,
                        "bitmap load failed twice, using empty placeholder"
                    );
                    PreparedBitmap::placeholder()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::error::AdmillError;

    fn png_bytes(width: u32, height: u32, rgba: Vec<u8>) -> Vec<u8> {
        let img = image::RgbaImage::from_raw(width, height, rgba).unwrap();
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    struct MapSource(HashMap<String, Vec<u8>>);

    impl BitmapSource for MapSource {
        fn fetch(&self, url: &str) -> AdmillResult<Vec<u8>> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| AdmillError::decode(format!("no bytes for {url}")))
        }
    }

    struct ProxyOnlySource(Vec<u8>);

    impl BitmapSource for ProxyOnlySource {
        fn fetch(&self, _url: &str) -> AdmillResult<Vec<u8>> {
            Err(AdmillError::decode("primary route down"))
        }

        fn fetch_fallback(&self, _url: &str) -> AdmillResult<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn decode_bitmap_png_dimensions_and_premul() {
        let buf = png_bytes(1, 1, vec![100, 50, 200, 128]);
        let prepared = decode_bitmap(&buf).unwrap();
        assert_eq!(prepared.width, 1);
        assert_eq!(prepared.height, 1);
        assert_eq!(
            prepared.rgba8_premul.as_slice(),
            &[
                ((100u16 * 128 + 127) / 255) as u8,
                ((50u16 * 128 + 127) / 255) as u8,
                ((200u16 * 128 + 127) / 255) as u8,
                128u8
            ]
        );
    }

    #[test]
    fn decode_bitmap_rejects_garbage() {
        assert!(decode_bitmap(b"not an image").is_err());
    }

    #[test]
    fn placeholder_draws_as_empty() {
        let placeholder = PreparedBitmap::placeholder();
        assert!(placeholder.is_empty());
        assert!(placeholder.rgba8_premul.is_empty());
    }

    #[test]
    fn cache_keeps_the_first_write() {
        let mut cache = BitmapCache::default();
        cache.insert(
            "mem://a".to_string(),
            PreparedBitmap {
                width: 2,
                height: 2,
                rgba8_premul: Arc::new(vec![0; 16]),
            },
        );
        cache.insert("mem://a".to_string(), PreparedBitmap::placeholder());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("mem://a").unwrap().width, 2);
    }

    #[test]
    fn prepare_loads_every_url_and_ticks_progress() {
        let mut bytes = HashMap::new();
        bytes.insert("mem://a".to_string(), png_bytes(1, 1, vec![255, 0, 0, 255]));
        bytes.insert("mem://b".to_string(), png_bytes(1, 1, vec![0, 255, 0, 255]));
        let source = MapSource(bytes);
        let urls = vec!["mem://a".to_string(), "mem://b".to_string()];

        let mut sink = crate::progress::CollectProgress::default();
        let cache = prepare_bitmaps(&source, &urls, &mut sink);

        assert_eq!(cache.len(), 2);
        assert!(!cache.get("mem://a").unwrap().is_empty());
        assert_eq!(
            sink.events,
            vec![(Phase::Preparing, 1, 2), (Phase::Preparing, 2, 2)]
        );
    }

    #[test]
    fn fallback_route_recovers_a_failed_fetch() {
        let source = ProxyOnlySource(png_bytes(1, 1, vec![1, 2, 3, 255]));
        let urls = vec!["mem://flaky".to_string()];
        let mut sink = crate::progress::NullProgress;
        let cache = prepare_bitmaps(&source, &urls, &mut sink);
        assert!(!cache.get("mem://flaky").unwrap().is_empty());
    }

    #[test]
    fn double_failure_caches_the_placeholder() {
        let source = MapSource(HashMap::new());
        let urls = vec!["mem://missing".to_string()];
        let mut sink = crate::progress::NullProgress;
        let cache = prepare_bitmaps(&source, &urls, &mut sink);
        assert!(cache.get("mem://missing").unwrap().is_empty());
    }
}
