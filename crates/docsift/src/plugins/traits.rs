//! Base plugin trait definition.
//!
//! Extractors and indexing plugins share the `Plugin` trait, which carries
//! identification and lifecycle hooks for the format registry.

use crate::Result;

/// Base trait that all plugins must implement.
///
/// # Thread Safety
///
/// All plugins must be `Send + Sync`: a built registry is shared across
/// worker threads behind an `Arc`.
///
/// # Example
///
/// ```rust
/// use docsift::plugins::Plugin;
/// use docsift::Result;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct LinkAuditor {
///     ready: AtomicBool,
/// }
///
/// impl Plugin for LinkAuditor {
///     fn name(&self) -> &str {
///         "link-auditor"
///     }
///
///     fn initialize(&self) -> Result<()> {
///         self.ready.store(true, Ordering::Release);
///         Ok(())
///     }
/// }
/// ```
pub trait Plugin: Send + Sync {
    /// Returns the unique name/identifier for this plugin.
    ///
    /// Lowercase with hyphens (e.g. `"pdf-extractor"`); whitespace is rejected
    /// at registration.
    fn name(&self) -> &str;

    /// Semantic version of this plugin, `MAJOR.MINOR.PATCH`.
    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    /// Called once when the plugin is registered.
    ///
    /// This method takes `&self` to work with `Arc<dyn Plugin>`; plugins needing
    /// mutable state should use interior mutability.
    ///
    /// # Errors
    ///
    /// The plugin is not registered if this returns an error.
    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// Called when the registry owning this plugin is shut down.
    ///
    /// Errors are logged but don't prevent the shutdown of other plugins.
    fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    /// Optional plugin description for debugging and logging.
    fn description(&self) -> &str {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct TestPlugin {
        initialized: AtomicBool,
    }

    impl Plugin for TestPlugin {
        fn name(&self) -> &str {
            "test-plugin"
        }

        fn initialize(&self) -> Result<()> {
            self.initialized.store(true, Ordering::Release);
            Ok(())
        }

        fn shutdown(&self) -> Result<()> {
            self.initialized.store(false, Ordering::Release);
            Ok(())
        }

        fn description(&self) -> &str {
            "A test plugin"
        }
    }

    struct BarePlugin;

    impl Plugin for BarePlugin {
        fn name(&self) -> &str {
            "bare"
        }
    }

    #[test]
    fn test_plugin_defaults() {
        let plugin = BarePlugin;
        assert_eq!(plugin.version(), env!("CARGO_PKG_VERSION"));
        assert_eq!(plugin.description(), "");
        assert!(plugin.initialize().is_ok());
        assert!(plugin.shutdown().is_ok());
    }

    #[test]
    fn test_plugin_lifecycle() {
        let plugin = TestPlugin {
            initialized: AtomicBool::new(false),
        };

        assert!(!plugin.initialized.load(Ordering::Acquire));

        plugin.initialize().unwrap();
        assert!(plugin.initialized.load(Ordering::Acquire));

        plugin.shutdown().unwrap();
        assert!(!plugin.initialized.load(Ordering::Acquire));
        assert_eq!(plugin.description(), "A test plugin");
    }
}
