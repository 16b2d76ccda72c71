//! CLI command implementations.

mod check;
mod resolve;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use weave_cache::{Cache, FileCache, NullCache};
use weave_config::{CliSettings, Config, IncludeConfig};
use weave_include::{CachedLoader, InclusionResolver, ResolverOptions, TagNames};
use weave_source::{ContentSource, FsSource, Locator};

use crate::error::CliError;
use crate::output::Output;

pub(crate) use check::CheckArgs;
pub(crate) use resolve::ResolveArgs;

/// Application version from Cargo.toml.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Arguments shared by every command that resolves documents.
#[derive(Args)]
pub(crate) struct LoadArgs {
    /// Locators of the documents to resolve, relative to the source directory.
    #[arg(required = true)]
    locators: Vec<String>,

    /// Path to configuration file (default: auto-discover weave.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Content source directory (overrides config).
    #[arg(short, long, env = "WEAVE_SOURCE_DIR")]
    source_dir: Option<PathBuf>,

    /// Leave markers for failed directives instead of removing them.
    #[arg(long)]
    diagnostics: bool,

    /// Maximum include nesting (overrides config).
    #[arg(long)]
    max_depth: Option<usize>,

    /// Disable the cross-run cache.
    #[arg(long)]
    no_cache: bool,
}

impl LoadArgs {
    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            source_dir: self.source_dir.clone(),
            cache_enabled: self.no_cache.then_some(false),
            diagnostics: self.diagnostics.then_some(true),
            max_depth: self.max_depth,
        }
    }

    fn locators(&self) -> Vec<Locator> {
        self.locators.iter().map(Locator::new).collect()
    }

    /// Load configuration and build a loader over the configured source.
    fn loader(&self, output: &Output) -> Result<CachedLoader, CliError> {
        let config = Config::load(self.config.as_deref(), Some(&self.cli_settings()))?;
        let project = &config.project;

        if !project.root_dir.is_dir() {
            return Err(CliError::Validation(format!(
                "Source directory not found: {}",
                project.root_dir.display()
            )));
        }
        output.info(&format!("Source: {}", project.root_dir.display()));

        let source: Arc<dyn ContentSource> = Arc::new(FsSource::new(project.root_dir.clone()));
        let resolver = InclusionResolver::new(source, resolver_options(&config.include));
        let cache: Box<dyn Cache> = if project.cache_enabled {
            Box::new(FileCache::new(project.cache_dir(), VERSION))
        } else {
            Box::new(NullCache)
        };

        Ok(CachedLoader::new(resolver, cache.as_ref()))
    }
}

fn resolver_options(include: &IncludeConfig) -> ResolverOptions {
    ResolverOptions {
        max_depth: include.max_depth,
        diagnostics: include.diagnostics,
        tags: TagNames {
            directive: include.directive.clone(),
            fallback: include.fallback.clone(),
            escape: include.escape.clone(),
            marker: include.marker.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_include_config_matches_resolver_defaults() {
        assert_eq!(
            resolver_options(&IncludeConfig::default()),
            ResolverOptions::default()
        );
    }

    #[test]
    fn test_cli_settings_only_override_given_flags() {
        let args = LoadArgs {
            locators: vec!["index.xml".to_owned()],
            config: None,
            source_dir: None,
            diagnostics: false,
            max_depth: Some(3),
            no_cache: true,
        };

        let settings = args.cli_settings();

        assert_eq!(settings.source_dir, None);
        assert_eq!(settings.diagnostics, None);
        assert_eq!(settings.cache_enabled, Some(false));
        assert_eq!(settings.max_depth, Some(3));
        assert_eq!(args.locators(), vec![Locator::new("index.xml")]);
    }
}
