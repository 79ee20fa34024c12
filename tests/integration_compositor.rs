mod common;

use std::io::Read;
use std::sync::Once;

use cardforge::store::DirectoryStore;
use cardforge::{CardRequest, Compositor, CompositorConfig, Error, ImageSource};
use common::{compositor, face, sample_png, CountingFetcher, MemoryStore, RejectingStore};
use tiny_http::{Response, Server};

static INIT: Once = Once::new();

fn start_image_server() -> String {
    INIT.call_once(|| {
        std::thread::spawn(|| {
            let server = Server::http("127.0.0.1:18091").unwrap();
            let png = sample_png();
            for mut request in server.incoming_requests() {
                let mut sink = Vec::new();
                let _ = request.as_reader().read_to_end(&mut sink);
                if request.url().ends_with("/lizard.png") {
                    let resp = Response::from_data(png.clone())
                        .with_header("Content-Type: image/png".parse::<tiny_http::Header>().unwrap());
                    let _ = request.respond(resp);
                } else {
                    let _ = request.respond(Response::from_string("not found").with_status_code(404));
                }
            }
        });
        std::thread::sleep(std::time::Duration::from_millis(100));
    });

    "http://127.0.0.1:18091".to_string()
}

fn decode_card(png: &[u8]) -> image::RgbaImage {
    image::load_from_memory_with_format(png, image::ImageFormat::Png)
        .expect("uploaded bytes are a PNG")
        .to_rgba8()
}

fn write_temp(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

#[tokio::test]
async fn local_source_renders_a_400x600_png_without_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(&dir, "photo.png", &sample_png());
    let fetcher = CountingFetcher::serving(Vec::new());
    let compositor = compositor(CompositorConfig::default(), fetcher.clone(), MemoryStore::default());

    let handle = compositor
        .render_card(CardRequest {
            source: ImageSource::Local { path: path.clone(), temporary: false },
            face: face("Creature", Some(4), Some(5)),
        })
        .await
        .unwrap();

    assert_eq!(handle.public_id, "Cards/card-1");
    assert_eq!(fetcher.count(), 0);
    assert_eq!(compositor.store().upload_count(), 1);
    assert_eq!(compositor.store().uploads.lock().unwrap()[0].0, "Cards");

    let card = decode_card(&compositor.store().last_png());
    assert_eq!(card.dimensions(), (400, 600));
    assert!(path.exists(), "non-temporary input must be kept");
}

#[tokio::test]
async fn remote_source_is_fetched_exactly_once() {
    let fetcher = CountingFetcher::serving(sample_png());
    let compositor = compositor(CompositorConfig::default(), fetcher.clone(), MemoryStore::default());

    compositor
        .render_card(CardRequest {
            source: ImageSource::parse("https://cdn.example.com/lizard.png", false).unwrap(),
            face: face("Spell", None, None),
        })
        .await
        .unwrap();

    assert_eq!(fetcher.count(), 1);
    assert_eq!(compositor.store().upload_count(), 1);
}

#[tokio::test]
async fn stat_badge_pixels_follow_the_card_kind() {
    let fetcher = CountingFetcher::serving(sample_png());
    let compositor = compositor(CompositorConfig::default(), fetcher, MemoryStore::default());
    let source = ImageSource::parse("https://cdn.example.com/lizard.png", false).unwrap();

    for (card_face, expect_badge) in [
        (face("Creature", Some(4), Some(5)), true),
        (face("Creature", Some(4), None), false),
        (face("Artifact", Some(4), Some(5)), false),
    ] {
        compositor
            .render_card(CardRequest { source: source.clone(), face: card_face })
            .await
            .unwrap();
        let card = decode_card(&compositor.store().last_png());
        // Inside the badge, clear of its label.
        let px = card.get_pixel(312, 553);
        if expect_badge {
            assert!(px[0] < 80 && px[1] < 80 && px[2] < 80, "badge missing: {:?}", px);
        } else {
            assert_eq!(px.0, [0xf0, 0xf0, 0xf0, 0xff]);
        }
    }
}

#[tokio::test]
async fn corrupt_source_fails_to_decode_and_uploads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(&dir, "upload.jpg", b"\xff\xd8\xff\xe0 definitely not a jpeg");
    let compositor = compositor(
        CompositorConfig::default(),
        CountingFetcher::serving(Vec::new()),
        MemoryStore::default(),
    );

    let err = compositor
        .render_card(CardRequest {
            source: ImageSource::Local { path: path.clone(), temporary: true },
            face: face("Creature", Some(1), Some(1)),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::DecodeError(_)), "got {:?}", err);
    assert_eq!(compositor.store().upload_count(), 0);
    assert!(!path.exists(), "temporary input must be removed after a failure");
}

#[tokio::test]
async fn temporary_input_is_removed_after_success() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(&dir, "upload.png", &sample_png());
    let compositor = compositor(
        CompositorConfig::default(),
        CountingFetcher::serving(Vec::new()),
        MemoryStore::default(),
    );

    compositor
        .render_card(CardRequest {
            source: ImageSource::Local { path: path.clone(), temporary: true },
            face: face("Spell", None, None),
        })
        .await
        .unwrap();

    assert!(!path.exists());
}

#[tokio::test]
async fn missing_local_file_is_a_resolution_error() {
    let compositor = compositor(
        CompositorConfig::default(),
        CountingFetcher::serving(Vec::new()),
        MemoryStore::default(),
    );
    let err = compositor
        .render_card(CardRequest {
            source: ImageSource::Local { path: "/nonexistent/cardforge/photo.png".into(), temporary: false },
            face: face("Spell", None, None),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SourceResolutionError(_)));
    assert_eq!(compositor.store().upload_count(), 0);
}

#[tokio::test]
async fn upload_failure_propagates_and_still_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(&dir, "upload.png", &sample_png());
    let spool = dir.path().join("spool");
    let config = CompositorConfig { spool_dir: Some(spool.clone()), ..Default::default() };
    let compositor = compositor(config, CountingFetcher::serving(Vec::new()), RejectingStore);

    let err = compositor
        .render_card(CardRequest {
            source: ImageSource::Local { path: path.clone(), temporary: true },
            face: face("Spell", None, None),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UploadError(ref m) if m.contains("quota")));
    assert!(!path.exists());
    assert_eq!(std::fs::read_dir(&spool).unwrap().count(), 0, "spooled PNG must be removed");
}

#[tokio::test]
async fn spooled_card_is_removed_after_upload() {
    let dir = tempfile::tempdir().unwrap();
    let spool = dir.path().join("spool");
    let config = CompositorConfig { spool_dir: Some(spool.clone()), ..Default::default() };
    let compositor = compositor(config, CountingFetcher::serving(sample_png()), MemoryStore::default());

    compositor
        .render_card(CardRequest {
            source: ImageSource::parse("https://cdn.example.com/a.png", false).unwrap(),
            face: face("Spell", None, None),
        })
        .await
        .unwrap();

    assert!(spool.is_dir());
    assert_eq!(std::fs::read_dir(&spool).unwrap().count(), 0);
}

#[tokio::test]
async fn http_fetcher_against_local_server_into_directory_store() {
    let base = start_image_server();
    let out = tempfile::tempdir().unwrap();
    let config = CompositorConfig { asset_folder: "Proofs".to_string(), ..Default::default() };
    let compositor = Compositor::from_config(config, DirectoryStore::new(out.path()).unwrap()).unwrap();

    let handle = compositor
        .render_card(CardRequest {
            source: ImageSource::parse(&format!("{}/lizard.png", base), false).unwrap(),
            face: face("Creature", Some(4), Some(5)),
        })
        .await
        .unwrap();

    assert!(handle.public_id.starts_with("Proofs/"));
    let png = std::fs::read(out.path().join(format!("{}.png", handle.public_id))).unwrap();
    assert_eq!(decode_card(&png).dimensions(), (400, 600));

    let err = compositor
        .render_card(CardRequest {
            source: ImageSource::parse(&format!("{}/missing.png", base), false).unwrap(),
            face: face("Spell", None, None),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SourceResolutionError(_)), "got {:?}", err);
}
