//! Collaborators the guard notifies: route listener, page title, user-facing
//! notifications and the loading indicator. Each has a small default
//! implementation usable headless.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::RwLock;
use tracing::{error, trace};

use crate::router::ResolvedLocation;

pub trait RouteListener: Send + Sync {
    fn on_route_change(&self, to: &ResolvedLocation);
}

pub trait TitleSink: Send + Sync {
    fn set_title(&self, title: Option<&str>);
}

pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

pub trait ProgressIndicator: Send + Sync {
    fn start(&self);
    fn done(&self);
}

/// Listener that ignores every change.
pub struct NoopListener;

impl RouteListener for NoopListener {
    fn on_route_change(&self, _to: &ResolvedLocation) {}
}

/// Keeps the current document title, `"<route title> | <app title>"`.
pub struct DocumentTitle {
    app_title: String,
    current: RwLock<String>,
}

impl DocumentTitle {
    pub fn new(app_title: &str) -> Self { Self { app_title: app_title.to_string(), current: RwLock::new(app_title.to_string()) } }

    pub fn get(&self) -> String { self.current.read().clone() }
}

impl TitleSink for DocumentTitle {
    fn set_title(&self, title: Option<&str>) {
        let t = match title.filter(|t| !t.is_empty()) {
            Some(t) => format!("{} | {}", t, self.app_title),
            None => self.app_title.clone(),
        };
        *self.current.write() = t;
    }
}

/// Error toasts, logged and kept for whoever renders them.
#[derive(Default)]
pub struct NotificationLog {
    messages: RwLock<Vec<String>>,
}

impl NotificationLog {
    pub fn new() -> Self { Self::default() }

    pub fn messages(&self) -> Vec<String> { self.messages.read().clone() }

    /// Take every pending message.
    pub fn drain(&self) -> Vec<String> { std::mem::take(&mut *self.messages.write()) }
}

impl Notifier for NotificationLog {
    fn error(&self, message: &str) {
        error!(target: "libris::guard", "{}", message);
        self.messages.write().push(message.to_string());
    }
}

/// Loading indicator state with start/done counters.
#[derive(Default)]
pub struct Progress {
    active: AtomicBool,
    started: AtomicUsize,
    finished: AtomicUsize,
}

impl Progress {
    pub fn new() -> Self { Self::default() }
    pub fn is_active(&self) -> bool { self.active.load(Ordering::Acquire) }
    pub fn started(&self) -> usize { self.started.load(Ordering::Acquire) }
    pub fn finished(&self) -> usize { self.finished.load(Ordering::Acquire) }
}

impl ProgressIndicator for Progress {
    fn start(&self) {
        self.active.store(true, Ordering::Release);
        self.started.fetch_add(1, Ordering::AcqRel);
        trace!(target: "libris::guard", "progress start");
    }

    fn done(&self) {
        self.active.store(false, Ordering::Release);
        self.finished.fetch_add(1, Ordering::AcqRel);
        trace!(target: "libris::guard", "progress done");
    }
}
