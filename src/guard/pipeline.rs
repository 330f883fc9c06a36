//! Drives a navigation through resolution, the guard and its redirects.
//!
//! Every navigation takes a generation number. A navigation that finishes
//! after a newer one started is cancelled: it commits nothing and runs no
//! after-hooks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info};

use super::navigation::{GuardDecision, NavigationGuard};
use crate::error::AppError;
use crate::router::{ResolvedLocation, Router};

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("navigation to '{0}' was superseded by a newer navigation")]
    Cancelled(String),
    #[error("too many redirects navigating to '{target}': {}", .chain.join(" -> "))]
    RedirectLoop { target: String, chain: Vec<String> },
    #[error("route materialization failed: {0}")]
    Materialization(AppError),
    #[error(transparent)]
    Resolve(#[from] AppError),
}

/// A committed navigation.
#[derive(Debug, Clone)]
pub struct NavigationOutcome {
    pub location: ResolvedLocation,
    /// Guard redirect targets followed on the way, in order.
    pub redirects: Vec<String>,
    /// Whether any hop asked to replace the history entry.
    pub replaced: bool,
}

pub struct Navigator {
    router: Arc<Router>,
    guard: Arc<NavigationGuard>,
    generation: AtomicU64,
    current: RwLock<Option<ResolvedLocation>>,
    max_redirects: usize,
}

impl Navigator {
    pub fn new(router: Arc<Router>, guard: Arc<NavigationGuard>) -> Self {
        let max_redirects = guard.config().max_redirects;
        Self { router, guard, generation: AtomicU64::new(0), current: RwLock::new(None), max_redirects }
    }

    pub fn current(&self) -> Option<ResolvedLocation> { self.current.read().clone() }

    pub fn guard(&self) -> &NavigationGuard { &self.guard }

    /// Forget the current location (after logout).
    pub fn clear(&self) { *self.current.write() = None; }

    pub async fn navigate(&self, target: &str) -> Result<NavigationOutcome, NavigationError> {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let from = self.current();
        let mut target = target.to_string();
        let mut redirects: Vec<String> = Vec::new();
        let mut replaced = false;
        loop {
            let to = self.router.resolve(&target)?;
            let decision = self.guard.before_each(&to, from.as_ref()).await;
            if self.generation.load(Ordering::Acquire) != generation {
                debug!(target: "libris::guard", "navigation to '{}' cancelled", to.full_path);
                return Err(NavigationError::Cancelled(to.full_path));
            }
            match decision {
                GuardDecision::Allow => {
                    *self.current.write() = Some(to.clone());
                    self.guard.after_each(&to);
                    info!(target: "libris::guard", "navigated to {}", to.full_path);
                    return Ok(NavigationOutcome { location: to, redirects, replaced });
                }
                GuardDecision::Redirect(r) => {
                    if redirects.len() >= self.max_redirects {
                        return Err(NavigationError::RedirectLoop { target: r.target, chain: redirects });
                    }
                    debug!(target: "libris::guard", "redirect {} -> {} (replace={})", to.full_path, r.target, r.replace);
                    replaced |= r.replace;
                    redirects.push(r.target.clone());
                    target = r.target;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod pipeline_tests;
