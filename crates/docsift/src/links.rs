//! Outbound link canonicalization and accumulation.
//!
//! Every extractor funnels links through a [`LinkCollector`], which resolves
//! raw references against the document URL, drops recursive or overlong
//! URLs, deduplicates by canonical URL and accumulates anchor text.

use indexmap::IndexMap;
use url::Url;

/// Upper bound on the accumulated anchor text kept per link, in characters.
pub const MAX_LINK_TEXT_LEN: usize = 256;

/// Path segments repeated this many times mark a crawler trap.
const MAX_SEGMENT_REPEATS: usize = 3;

const ALLOWED_SCHEMES: &[&str] = &["http", "https", "ftp", "gopher", "smb"];

/// Collaborator resolving raw link references into canonical URLs.
pub trait UrlResolver: Send + Sync {
    /// Resolve `raw` against `base`, returning `None` for unusable references.
    fn canonicalize(&self, raw: &str, base: &Url) -> Option<Url>;

    /// True when the URL looks like a self-referencing crawler trap.
    fn is_recursive(&self, url: &Url) -> bool;
}

/// `url`-crate based resolver.
///
/// Fragments are dropped; only crawlable schemes survive.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultUrlResolver;

impl UrlResolver for DefaultUrlResolver {
    fn canonicalize(&self, raw: &str, base: &Url) -> Option<Url> {
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('#') {
            return None;
        }

        let mut url = base.join(raw).ok()?;
        if !ALLOWED_SCHEMES.contains(&url.scheme()) {
            return None;
        }
        if url.host_str().is_none_or(str::is_empty) {
            return None;
        }
        url.set_fragment(None);
        Some(url)
    }

    fn is_recursive(&self, url: &Url) -> bool {
        let Some(segments) = url.path_segments() else {
            return false;
        };

        let mut counts: IndexMap<&str, usize> = IndexMap::new();
        for segment in segments.filter(|s| !s.is_empty()) {
            let count = counts.entry(segment).or_insert(0);
            *count += 1;
            if *count >= MAX_SEGMENT_REPEATS {
                return true;
            }
        }
        false
    }
}

/// Accumulates canonical links for one document.
pub struct LinkCollector<'a> {
    base: Url,
    resolver: &'a dyn UrlResolver,
    max_links: usize,
    max_url_length: usize,
    links: IndexMap<Url, String>,
}

impl<'a> LinkCollector<'a> {
    pub fn new(base: &Url, resolver: &'a dyn UrlResolver, max_links: usize, max_url_length: usize) -> Self {
        Self {
            base: base.clone(),
            resolver,
            max_links,
            max_url_length,
            links: IndexMap::new(),
        }
    }

    /// Replace the base URL used to resolve relative references (`<base href>`).
    pub fn set_base(&mut self, base: Url) {
        self.base = base;
    }

    /// Resolve and add a raw link reference. Returns true when it was kept.
    pub fn add(&mut self, raw: &str, text: &str) -> bool {
        match self.resolver.canonicalize(raw, &self.base) {
            Some(url) => self.add_url(url, text),
            None => false,
        }
    }

    /// Add an already absolute URL. Returns true when it was kept.
    pub fn add_url(&mut self, url: Url, text: &str) -> bool {
        if url.as_str().len() >= self.max_url_length || self.resolver.is_recursive(&url) {
            return false;
        }

        let text = normalize_whitespace(text);
        if let Some(existing) = self.links.get_mut(&url) {
            append_link_text(existing, &text);
            return true;
        }

        if self.links.len() >= self.max_links {
            return false;
        }

        let mut entry = String::new();
        append_link_text(&mut entry, &text);
        self.links.insert(url, entry);
        true
    }

    /// Merge links gathered elsewhere (e.g. EPUB chapters), respecting the caps.
    pub fn extend(&mut self, links: IndexMap<Url, String>) {
        for (url, text) in links {
            self.add_url(url, &text);
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.links.len() >= self.max_links
    }

    pub fn into_links(self) -> IndexMap<Url, String> {
        self.links
    }
}

fn append_link_text(existing: &mut String, text: &str) {
    if text.is_empty() || existing.contains(text) {
        return;
    }
    let current = existing.chars().count();
    if current >= MAX_LINK_TEXT_LEN {
        return;
    }
    if !existing.is_empty() {
        existing.push(' ');
    }
    let room = MAX_LINK_TEXT_LEN.saturating_sub(current + 1);
    existing.extend(text.chars().take(room));
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/dir/page.html").unwrap()
    }

    #[test]
    fn test_canonicalize_relative_and_fragment() {
        let resolver = DefaultUrlResolver;
        let url = resolver.canonicalize("../other.html#section", &base()).unwrap();
        assert_eq!(url.as_str(), "https://example.com/other.html");
    }

    #[test]
    fn test_canonicalize_rejects_unusable_schemes() {
        let resolver = DefaultUrlResolver;
        assert!(resolver.canonicalize("javascript:void(0)", &base()).is_none());
        assert!(resolver.canonicalize("mailto:someone@example.com", &base()).is_none());
        assert!(resolver.canonicalize("#top", &base()).is_none());
        assert!(resolver.canonicalize("   ", &base()).is_none());
    }

    #[test]
    fn test_is_recursive() {
        let resolver = DefaultUrlResolver;
        let trap = Url::parse("https://example.com/a/b/a/b/a/b/").unwrap();
        assert!(resolver.is_recursive(&trap));
        let fine = Url::parse("https://example.com/a/b/c/").unwrap();
        assert!(!resolver.is_recursive(&fine));
    }

    #[test]
    fn test_collector_dedups_and_accumulates_text() {
        let resolver = DefaultUrlResolver;
        let mut collector = LinkCollector::new(&base(), &resolver, 10, 1024);
        assert!(collector.add("/a", "first"));
        assert!(collector.add("https://example.com/a", "second"));
        assert!(collector.add("https://example.com/a#frag", "first"));

        let links = collector.into_links();
        assert_eq!(links.len(), 1);
        let text = links.values().next().unwrap();
        assert_eq!(text, "first second");
    }

    #[test]
    fn test_collector_caps_links_and_url_length() {
        let resolver = DefaultUrlResolver;
        let mut collector = LinkCollector::new(&base(), &resolver, 2, 40);
        assert!(collector.add("/1", ""));
        assert!(collector.add("/2", ""));
        assert!(!collector.add("/3", ""));
        assert!(collector.is_full());

        let mut short = LinkCollector::new(&base(), &resolver, 10, 40);
        assert!(!short.add("/a-very-long-path-that-goes-past-the-limit", ""));
        assert!(short.is_empty());
    }

    #[test]
    fn test_link_text_is_capped() {
        let resolver = DefaultUrlResolver;
        let mut collector = LinkCollector::new(&base(), &resolver, 10, 1024);
        let long = "x".repeat(MAX_LINK_TEXT_LEN * 2);
        collector.add("/long", &long);
        collector.add("/long", "more");
        let links = collector.into_links();
        assert!(links.values().next().unwrap().chars().count() <= MAX_LINK_TEXT_LEN);
    }
}
