use anyhow::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::Configuration;
use crate::core::PhraseMatcher;
use crate::templates::TemplateManager;

/// State shared by every request handler.
pub struct AppState {
    pub config: Configuration,
    pub matcher: Arc<PhraseMatcher>,
    pub templates: TemplateManager,
    pub start_time: Instant,
    pub request_count: AtomicU64,
}

impl AppState {
    pub fn new(config: Configuration, matcher: Arc<PhraseMatcher>) -> Result<Self> {
        Ok(Self {
            config,
            matcher,
            templates: TemplateManager::new()?,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
        })
    }

    /// Increment request counter, returning the previous count
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
