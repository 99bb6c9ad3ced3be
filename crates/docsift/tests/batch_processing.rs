//! Concurrent batch extraction.

#![cfg(feature = "tokio-runtime")]

use docsift::{BatchItem, ExtractionConfig, batch_extract_bytes};
use url::Url;

fn item(content: &str, mime_type: &str, path: &str) -> BatchItem {
    BatchItem::new(
        content.as_bytes().to_vec(),
        mime_type,
        Url::parse(&format!("https://example.com/{path}")).unwrap(),
    )
}

#[tokio::test]
async fn test_batch_results_follow_input_order() {
    let items: Vec<BatchItem> = (0..32)
        .map(|i| item(&format!("<title>Page {i}</title><p>Body {i}</p>"), "text/html", &format!("{i}.html")))
        .collect();
    let config = ExtractionConfig {
        max_concurrent_extractions: Some(3),
        ..Default::default()
    };

    let summaries = batch_extract_bytes(items, &config).await.unwrap();
    assert_eq!(summaries.len(), 32);
    for (i, summary) in summaries.iter().enumerate() {
        assert_eq!(summary.as_ref().unwrap().title, format!("Page {i}"));
    }
}

#[tokio::test]
async fn test_batch_mixed_formats_and_rejections() {
    let binary = BatchItem::new(
        vec![0u8, 159, 146, 150, 0, 1, 2, 3],
        "application/x-unknown",
        Url::parse("https://example.com/blob").unwrap(),
    );
    let items = vec![
        item("plain words", "text/plain", "a.txt"),
        binary,
        item("<urlset><url><loc>https://example.com/x</loc></url></urlset>", "application/xml", "sitemap.xml"),
    ];

    let summaries = batch_extract_bytes(items, &ExtractionConfig::default()).await.unwrap();
    assert_eq!(summaries.len(), 3);
    assert_eq!(summaries[0].as_ref().unwrap().description, "plain words");
    assert!(summaries[1].is_none());
    assert!(summaries[2].as_ref().unwrap().just_metadata);
}
