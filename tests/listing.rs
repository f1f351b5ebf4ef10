use assert_matches::assert_matches;

use bib_photo_mirror::catalog::EventCatalog;
use bib_photo_mirror::error::PhotoError;
use bib_photo_mirror::listing::extract_entries;

const PAGE: &str = r#"
<html><body>
  <div class="galeria">
    <a class="fotoCorredor" href="https://fotos.test/fotos/visualizar/id/101/evento/9">
      <img src="https://thumbs.test/p/a.jpg" alt="">
    </a>
    <a class="fotoCorredor" href="https://fotos.test/fotos/visualizar/id/102/evento/9">
      <img src="https://thumbs.test/p/b.jpg" alt="">
    </a>
    <a class="menu" href="/id/999/">not a photo</a>
  </div>
</body></html>
"#;

#[test]
fn extracts_one_entry_per_photo_anchor() {
    let catalog = EventCatalog::builtin();
    let event = catalog.resolve("bpc_conde_2022.csv").unwrap();

    let entries = extract_entries(PAGE, event).unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].key, "a.jpg");
    assert_eq!(entries[0].low_url.as_deref(), Some("https://thumbs.test/p/a.jpg"));
    assert_eq!(entries[0].high_url, event.high_url_for("101"));
    assert_eq!(entries[1].key, "b.jpg");
    assert_eq!(entries[1].high_url, event.high_url_for("102"));
    assert!(entries.iter().all(|entry| entry.local_path.is_none()));
}

#[test]
fn page_without_photos_is_empty() {
    let catalog = EventCatalog::builtin();
    let event = catalog.resolve("bpc_conde_2022.csv").unwrap();

    let entries = extract_entries("<html><body><p>Nenhuma foto</p></body></html>", event).unwrap();
    assert!(entries.is_empty());
}

#[test]
fn anchor_without_photo_id_is_malformed() {
    let catalog = EventCatalog::builtin();
    let event = catalog.resolve("bpc_conde_2022.csv").unwrap();
    let html = r#"<a class="fotoCorredor" href="/fotos/visualizar"><img src="x.jpg"></a>"#;

    assert_matches!(extract_entries(html, event), Err(PhotoError::ListingParse(_)));
}
