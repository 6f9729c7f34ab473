use std::sync::Arc;

use crate::config::Config;
use crate::export::{LayoutRasterizer, Rasterizer};
use crate::extraction::{NativeTextExtractor, TextExtractor};
use crate::navigation::NavigationContext;
use crate::storage::{Autosave, Repository};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub repo: Repository,
    /// Debounced writer for builder drafts.
    pub autosave: Autosave,
    /// Pluggable text extraction. Default: NativeTextExtractor.
    pub extractor: Arc<dyn TextExtractor>,
    /// Pluggable capture backend for PDF export. Default: LayoutRasterizer.
    pub rasterizer: Arc<dyn Rasterizer>,
    pub navigation: NavigationContext,
}

impl AppState {
    /// Wires the default extractor and rasterizer around `repo`. Spawns the
    /// autosave task, so it must be called inside a Tokio runtime.
    pub fn new(config: Config, repo: Repository) -> Self {
        let autosave = Autosave::spawn(repo.clone(), config.autosave_debounce);
        AppState {
            config,
            repo,
            autosave,
            extractor: Arc::new(NativeTextExtractor),
            rasterizer: Arc::new(LayoutRasterizer),
            navigation: NavigationContext::new(),
        }
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self::new(Config::default(), Repository::in_memory())
    }
}
