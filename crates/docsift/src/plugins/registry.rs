//! Format registry.
//!
//! Extractors and indexing plugins are registered once into a
//! [`FormatRegistryBuilder`], which freezes into an immutable
//! [`FormatRegistry`] shared behind an `Arc`. Lookups never lock.

use crate::extractors::PlainTextExtractor;
use crate::plugins::{DocumentExtractor, IndexingPlugin};
use crate::{DocsiftError, Result};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Keyed by priority, then registration order; later registrations win ties.
type PriorityMap = BTreeMap<(i32, usize), Arc<dyn DocumentExtractor>>;

fn validate_plugin_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(DocsiftError::validation("Plugin name cannot be empty"));
    }

    if name.contains(char::is_whitespace) {
        return Err(DocsiftError::validation(format!(
            "Plugin name '{}' cannot contain whitespace",
            name
        )));
    }

    Ok(())
}

/// Collects extractors and plugins before freezing them into a [`FormatRegistry`].
///
/// Registering a name twice is a no-op, so registration passes may safely
/// run more than once.
///
/// # Example
///
/// ```rust
/// use docsift::extractors::{register_default_extractors, PlainTextExtractor};
/// use docsift::plugins::registry::FormatRegistryBuilder;
/// use std::sync::Arc;
///
/// let mut builder = FormatRegistryBuilder::new();
/// register_default_extractors(&mut builder).unwrap();
/// builder.register(Arc::new(PlainTextExtractor::new())).unwrap();
/// let registry = builder.build();
/// assert!(registry.get("text/html").is_some());
/// ```
#[derive(Default)]
pub struct FormatRegistryBuilder {
    extractors: IndexMap<String, Arc<dyn DocumentExtractor>>,
    plugins: IndexMap<String, Arc<dyn IndexingPlugin>>,
}

impl FormatRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extractor.
    ///
    /// # Errors
    ///
    /// - `DocsiftError::Validation` for an empty or whitespace-containing name
    /// - any error returned by the extractor's `initialize()`
    pub fn register(&mut self, extractor: Arc<dyn DocumentExtractor>) -> Result<()> {
        let name = extractor.name().to_string();
        validate_plugin_name(&name)?;

        if self.extractors.contains_key(&name) {
            tracing::debug!(extractor = %name, "Extractor already registered, skipping");
            return Ok(());
        }

        extractor.initialize()?;
        self.extractors.insert(name, extractor);
        Ok(())
    }

    /// Register an indexing plugin. Duplicate names are ignored.
    pub fn register_plugin(&mut self, plugin: Arc<dyn IndexingPlugin>) -> Result<()> {
        let name = plugin.name().to_string();
        validate_plugin_name(&name)?;

        if self.plugins.contains_key(&name) {
            tracing::debug!(plugin = %name, "Indexing plugin already registered, skipping");
            return Ok(());
        }

        plugin.initialize()?;
        self.plugins.insert(name, plugin);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Freeze the registered entries into lookup tables.
    pub fn build(self) -> FormatRegistry {
        let mut mime_to_extractor: HashMap<String, PriorityMap> = HashMap::new();
        let mut extension_to_extractor: HashMap<String, PriorityMap> = HashMap::new();
        let mut root_to_extractor: HashMap<String, PriorityMap> = HashMap::new();
        let mut indexed_extensions = BTreeSet::new();
        let mut image_extensions = BTreeSet::new();
        let mut fallback: Option<Arc<dyn DocumentExtractor>> = None;

        for (index, extractor) in self.extractors.values().enumerate() {
            let priority = (extractor.priority(), index);

            for mime_type in extractor.supported_mime_types() {
                mime_to_extractor
                    .entry(mime_type.to_ascii_lowercase())
                    .or_default()
                    .insert(priority, Arc::clone(extractor));
            }

            for extension in extractor.supported_extensions() {
                let extension = extension.trim_start_matches('.').to_ascii_lowercase();
                extension_to_extractor
                    .entry(extension.clone())
                    .or_default()
                    .insert(priority, Arc::clone(extractor));
                if extractor.is_image_format() {
                    image_extensions.insert(extension.clone());
                }
                indexed_extensions.insert(extension);
            }

            for root in extractor.supported_root_elements() {
                root_to_extractor
                    .entry(root.to_ascii_lowercase())
                    .or_default()
                    .insert(priority, Arc::clone(extractor));
            }

            if extractor.name() == PlainTextExtractor::NAME {
                fallback = Some(Arc::clone(extractor));
            }
        }

        let mut plugins: Vec<Arc<dyn IndexingPlugin>> = self.plugins.into_values().collect();
        plugins.sort_by_key(|plugin| plugin.processing_stage());

        FormatRegistry {
            mime_to_extractor,
            extension_to_extractor,
            root_to_extractor,
            indexed_extensions,
            image_extensions,
            extractors: self.extractors,
            plugins,
            fallback: fallback.unwrap_or_else(|| Arc::new(PlainTextExtractor::new())),
        }
    }
}

/// Immutable format lookup tables.
pub struct FormatRegistry {
    mime_to_extractor: HashMap<String, PriorityMap>,
    extension_to_extractor: HashMap<String, PriorityMap>,
    root_to_extractor: HashMap<String, PriorityMap>,
    indexed_extensions: BTreeSet<String>,
    image_extensions: BTreeSet<String>,
    extractors: IndexMap<String, Arc<dyn DocumentExtractor>>,
    plugins: Vec<Arc<dyn IndexingPlugin>>,
    fallback: Arc<dyn DocumentExtractor>,
}

impl FormatRegistry {
    pub fn builder() -> FormatRegistryBuilder {
        FormatRegistryBuilder::new()
    }

    /// Highest-priority extractor for a normalized MIME type.
    ///
    /// Exact entries win over `type/*` wildcard entries.
    pub fn get(&self, mime_type: &str) -> Option<Arc<dyn DocumentExtractor>> {
        if let Some(priority_map) = self.mime_to_extractor.get(mime_type)
            && let Some((_priority, extractor)) = priority_map.iter().next_back()
        {
            return Some(Arc::clone(extractor));
        }

        let mut best_match: Option<((i32, usize), Arc<dyn DocumentExtractor>)> = None;
        for (registered_mime, priority_map) in &self.mime_to_extractor {
            let Some(prefix) = registered_mime.strip_suffix('*') else {
                continue;
            };
            if !prefix.ends_with('/') || !mime_type.starts_with(prefix) {
                continue;
            }
            if let Some((&priority, extractor)) = priority_map.iter().next_back()
                && best_match.as_ref().is_none_or(|(current, _)| priority > *current)
            {
                best_match = Some((priority, Arc::clone(extractor)));
            }
        }

        best_match.map(|(_, extractor)| extractor)
    }

    pub fn get_by_extension(&self, extension: &str) -> Option<Arc<dyn DocumentExtractor>> {
        highest(self.extension_to_extractor.get(&extension.to_ascii_lowercase()))
    }

    /// Extractor for an XML root element name.
    ///
    /// Lookup is case-insensitive; a namespace prefix (`rdf:RDF`) is tried as
    /// given and then by local name.
    pub fn get_by_root_element(&self, name: &str) -> Option<Arc<dyn DocumentExtractor>> {
        let name = name.to_ascii_lowercase();
        highest(self.root_to_extractor.get(&name)).or_else(|| {
            let (_, local) = name.rsplit_once(':')?;
            highest(self.root_to_extractor.get(local))
        })
    }

    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn DocumentExtractor>> {
        self.extractors.get(name).cloned()
    }

    /// The plain-text extractor every other extractor degrades to.
    pub fn plain_text(&self) -> Arc<dyn DocumentExtractor> {
        Arc::clone(&self.fallback)
    }

    pub fn is_indexed_extension(&self, extension: &str) -> bool {
        self.indexed_extensions
            .contains(extension.trim_start_matches('.').to_ascii_lowercase().as_str())
    }

    pub fn is_image_extension(&self, extension: &str) -> bool {
        self.image_extensions
            .contains(extension.trim_start_matches('.').to_ascii_lowercase().as_str())
    }

    pub fn indexed_extensions(&self) -> impl Iterator<Item = &str> {
        self.indexed_extensions.iter().map(String::as_str)
    }

    pub fn image_extensions(&self) -> impl Iterator<Item = &str> {
        self.image_extensions.iter().map(String::as_str)
    }

    /// Sorted list of every registered MIME type.
    pub fn supported_mime_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.mime_to_extractor.keys().cloned().collect();
        types.sort();
        types
    }

    /// Extractor names in registration order.
    pub fn list(&self) -> Vec<String> {
        self.extractors.keys().cloned().collect()
    }

    pub fn extractors(&self) -> impl Iterator<Item = &Arc<dyn DocumentExtractor>> {
        self.extractors.values()
    }

    /// Indexing plugins ordered by processing stage.
    pub fn plugins(&self) -> &[Arc<dyn IndexingPlugin>] {
        &self.plugins
    }

    /// Call `shutdown()` on every extractor and plugin.
    ///
    /// All plugins are shut down even when one fails; the first error is returned.
    pub fn shutdown_all(&self) -> Result<()> {
        let mut first_error = None;

        for (name, extractor) in &self.extractors {
            if let Err(e) = extractor.shutdown() {
                tracing::warn!(extractor = %name, error = %e, "Extractor shutdown failed");
                first_error.get_or_insert(e);
            }
        }
        for plugin in &self.plugins {
            if let Err(e) = plugin.shutdown() {
                tracing::warn!(plugin = plugin.name(), error = %e, "Indexing plugin shutdown failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn highest(priority_map: Option<&PriorityMap>) -> Option<Arc<dyn DocumentExtractor>> {
    priority_map
        .and_then(|map| map.iter().next_back())
        .map(|(_, extractor)| Arc::clone(extractor))
}

static FORMAT_REGISTRY: Lazy<Arc<FormatRegistry>> = Lazy::new(|| {
    let mut builder = FormatRegistryBuilder::new();
    if let Err(e) = crate::extractors::register_default_extractors(&mut builder) {
        tracing::warn!(error = %e, "Failed to register default extractors");
    }
    Arc::new(builder.build())
});

/// Process-wide registry with the built-in extractors.
///
/// Built on first use; every call returns the same instance.
pub fn get_format_registry() -> Arc<FormatRegistry> {
    Arc::clone(&FORMAT_REGISTRY)
}
