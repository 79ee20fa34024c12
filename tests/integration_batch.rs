mod common;

use cardforge::manifest::{render_all, Manifest};
use cardforge::{CompositorConfig, Error};
use common::{compositor, sample_png, CountingFetcher, MemoryStore};

#[tokio::test]
async fn every_manifest_row_is_rendered_and_uploaded() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("art")).unwrap();
    std::fs::write(dir.path().join("art/imp.png"), sample_png()).unwrap();
    let manifest_path = dir.path().join("cards.json");
    std::fs::write(
        &manifest_path,
        r##"[
            {"image":"art/imp.png","title":"Imp","type":"Creature","cost":1,"attack":1,"defense":1,"description":"Small.","frameColor":"#333"},
            {"image":"https://cdn.example.com/bolt.png","title":"Bolt","type":"Spell","cost":1,"description":"Zap.","frameColor":"blue","creator":"Ann"},
            {"image":"art/imp.png","title":"Imp Again","type":"Artifact","cost":0,"description":"","frameColor":"#999"}
        ]"##,
    )
    .unwrap();

    let manifest = Manifest::load(&manifest_path).unwrap();
    let requests = manifest.requests().unwrap();
    let fetcher = CountingFetcher::serving(sample_png());
    let compositor = compositor(CompositorConfig::default(), fetcher.clone(), MemoryStore::default());

    let results = render_all(&compositor, requests, 2).await;

    let mut ids: Vec<String> = results.into_iter().map(|r| r.unwrap().public_id).collect();
    ids.sort();
    assert_eq!(ids, ["Cards/card-1", "Cards/card-2", "Cards/card-3"]);
    assert_eq!(compositor.store().upload_count(), 3);
    assert_eq!(fetcher.count(), 1);
    assert!(dir.path().join("art/imp.png").exists(), "manifest images are never deleted");
}

#[test]
fn missing_image_rejects_the_sheet_before_rendering() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("art")).unwrap();
    std::fs::write(dir.path().join("art/imp.png"), sample_png()).unwrap();
    let manifest_path = dir.path().join("cards.json");
    std::fs::write(
        &manifest_path,
        r##"[
            {"image":"art/imp.png","title":"Imp","type":"Creature","cost":1,"attack":1,"defense":1,"description":"Small.","frameColor":"#333"},
            {"image":"art/missing.png","title":"Ghost","type":"Spell","cost":2,"description":"Gone.","frameColor":"#999"}
        ]"##,
    )
    .unwrap();

    let manifest = Manifest::load(&manifest_path).unwrap();
    let err = manifest.requests().unwrap_err();
    assert!(matches!(err, Error::InvalidCard(ref m) if m.contains("row 2: image not found")), "got {:?}", err);
}

#[test]
fn invalid_manifest_is_rejected_before_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cards.json");
    std::fs::write(
        &path,
        r##"[{"image":"a.png","title":"Imp","type":"Creature","cost":11,"attack":1,"defense":1,"description":"","frameColor":"#333"}]"##,
    )
    .unwrap();
    let err = Manifest::load(&path).unwrap_err();
    assert!(matches!(err, Error::InvalidCard(ref m) if m.contains("row 1: cost")));
}
