//! XML sitemap extractor.
//!
//! Sitemaps can be large and are often cut off mid-download, so they are
//! streamed with `quick-xml` instead of being parsed into a tree. Whatever
//! `<loc>` entries were read before the first syntax error are kept.

use crate::core::context::ExtractionContext;
use crate::core::mime::SITEMAP_MIME_TYPE;
use crate::error::Result;
use crate::extraction::xml::resolve_entity;
use crate::plugins::{DocumentExtractor, Plugin};
use crate::types::{RenderedContent, Summary};
use quick_xml::Reader;
use quick_xml::events::Event;
use url::Url;

/// Compressed child sitemaps are not followed.
const COMPRESSED_SUFFIX: &str = ".gz";

/// Sitemap and sitemap index extractor.
pub struct SitemapExtractor;

impl SitemapExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SitemapExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for SitemapExtractor {
    fn name(&self) -> &str {
        "sitemap-extractor"
    }

    fn description(&self) -> &str {
        "Collects page locations from XML sitemaps and sitemap indexes"
    }
}

impl DocumentExtractor for SitemapExtractor {
    fn extract(&self, content: &[u8], url: &Url, ctx: &ExtractionContext) -> Result<Summary> {
        let mut links = ctx.sitemap_link_collector(url);
        let mut reader = Reader::from_reader(content);
        reader.config_mut().check_end_names = false;

        let mut buf = Vec::new();
        let mut in_entry = false;
        let mut in_loc = false;
        let mut loc = String::new();
        let mut skipped = 0usize;

        loop {
            let event = match reader.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(e) => {
                    tracing::debug!(url = %url, position = reader.buffer_position(), error = %e, "Sitemap truncated or malformed");
                    break;
                }
            };

            match event {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"url" | b"sitemap" => in_entry = true,
                    b"loc" if in_entry => {
                        in_loc = true;
                        loc.clear();
                    }
                    _ => {}
                },
                Event::Text(t) if in_loc => loc.push_str(&String::from_utf8_lossy(t.as_ref())),
                Event::CData(t) if in_loc => loc.push_str(&String::from_utf8_lossy(t.as_ref())),
                Event::GeneralRef(r) if in_loc => {
                    if let Some(c) = resolve_entity(&String::from_utf8_lossy(&r)) {
                        loc.push(c);
                    }
                }
                Event::End(e) => match e.local_name().as_ref() {
                    b"loc" if in_loc => {
                        in_loc = false;
                        let target = loc.trim();
                        if target.to_ascii_lowercase().ends_with(COMPRESSED_SUFFIX) {
                            skipped += 1;
                        } else {
                            links.add(target, "");
                        }
                        if links.is_full() {
                            break;
                        }
                    }
                    b"url" | b"sitemap" => in_entry = false,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        tracing::debug!(url = %url, links = links.len(), skipped, "Sitemap parsed");

        let mut summary = Summary::new(url, SITEMAP_MIME_TYPE, RenderedContent::xml(String::from_utf8_lossy(content)));
        summary.just_metadata = true;
        summary.links = links.into_links();
        Ok(summary)
    }

    fn supported_mime_types(&self) -> &[&str] {
        &[SITEMAP_MIME_TYPE]
    }

    fn supported_root_elements(&self) -> &[&str] {
        &["urlset", "sitemapindex"]
    }
}
