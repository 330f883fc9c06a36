//! Role-filtered route sets.
//!
//! [`PermissionStore`] turns the gated route table into the list of routes to
//! register for a role set, and tracks whether that has happened yet for the
//! current session. The tracking is a small state machine
//! (`Empty -> InFlight -> Ready`, back to `Empty` on failure or logout) claimed
//! with a compare-and-swap, so two overlapping navigations never both
//! materialize.

use std::sync::atomic::{AtomicU8, Ordering};

use futures_util::future::BoxFuture;
use parking_lot::RwLock;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::config::RouterConfig;
use crate::error::AppResult;
use crate::identity::roles_admit;
use crate::router::{flatten, RouteDef, RouteForest, RouteId};

/// Produces the gated routes to register. `roles == None` means every gated
/// route, unfiltered.
pub trait RouteMaterializer: Send + Sync {
    fn materialize<'a>(&'a self, roles: Option<&'a [String]>) -> BoxFuture<'a, AppResult<RouteForest>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MaterializeState {
    Empty = 0,
    InFlight = 1,
    Ready = 2,
}

impl MaterializeState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => MaterializeState::InFlight,
            2 => MaterializeState::Ready,
            _ => MaterializeState::Empty,
        }
    }
}

/// Outcome of [`PermissionStore::try_claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The caller owns materialization; wrap it in a [`ClaimGuard`].
    Claimed,
    /// Another navigation is materializing.
    InFlight,
    Ready,
}

pub struct PermissionStore {
    constant: RouteForest,
    gated: RouteForest,
    config: RouterConfig,
    /// Constant plus accessible gated routes, for menus.
    routes: RwLock<RouteForest>,
    /// Accessible gated routes, flattened when configured; what gets registered.
    add_routes: RwLock<RouteForest>,
    state: AtomicU8,
    settled: Notify,
}

impl PermissionStore {
    pub fn new(constant: &[RouteDef], gated: &[RouteDef], config: RouterConfig) -> Self {
        Self {
            constant: RouteForest::from_defs(constant),
            gated: RouteForest::from_defs(gated),
            config,
            routes: RwLock::new(RouteForest::new()),
            add_routes: RwLock::new(RouteForest::new()),
            state: AtomicU8::new(MaterializeState::Empty as u8),
            settled: Notify::new(),
        }
    }

    pub fn config(&self) -> &RouterConfig { &self.config }
    pub fn gated(&self) -> &RouteForest { &self.gated }

    /// Keep a node iff its role requirement admits `roles`, recursing into the
    /// children of kept nodes. A kept node whose children are all pruned stays,
    /// childless.
    pub fn compute_accessible_routes(roles: &[String], routes: &RouteForest) -> RouteForest {
        let mut out = RouteForest::new();
        for &r in routes.roots() {
            filter_into(routes, r, roles, None, &mut out);
        }
        out
    }

    /// Materialize the gated routes `roles` may see.
    pub fn set_routes(&self, roles: &[String]) -> RouteForest {
        let accessed = Self::compute_accessible_routes(roles, &self.gated);
        debug!(target: "libris::permission", "roles {:?} admit {} of {} gated roots", roles, accessed.len(), self.gated.len());
        self.set(accessed)
    }

    /// Materialize every gated route, for deployments without dynamic gating.
    pub fn set_all_routes(&self) -> RouteForest { self.set(self.gated.clone()) }

    fn set(&self, accessed: RouteForest) -> RouteForest {
        let mut all = self.constant.clone();
        for &r in accessed.roots() {
            all.graft(&accessed, r, None);
        }
        *self.routes.write() = all;
        let add = if self.config.third_level_route_cache { flatten(&accessed) } else { accessed };
        *self.add_routes.write() = add.clone();
        add
    }

    pub fn routes(&self) -> RouteForest { self.routes.read().clone() }
    pub fn add_routes(&self) -> RouteForest { self.add_routes.read().clone() }

    pub fn state(&self) -> MaterializeState { MaterializeState::from_u8(self.state.load(Ordering::Acquire)) }

    /// Claim materialization for this session. Must be called before the first
    /// await of the navigation that intends to materialize.
    pub fn try_claim(&self) -> Claim {
        match self.state.compare_exchange(
            MaterializeState::Empty as u8,
            MaterializeState::InFlight as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => Claim::Claimed,
            Err(v) => match MaterializeState::from_u8(v) {
                MaterializeState::Ready => Claim::Ready,
                _ => Claim::InFlight,
            },
        }
    }

    /// Mark the claimed materialization as registered. An empty result counts.
    pub fn complete(&self) {
        self.state.store(MaterializeState::Ready as u8, Ordering::Release);
        self.settled.notify_waiters();
    }

    /// Release a failed claim so the next navigation can retry. Whatever the
    /// failed attempt materialized is dropped with it.
    pub fn fail(&self) {
        self.clear_routes();
        self.state.store(MaterializeState::Empty as u8, Ordering::Release);
        self.settled.notify_waiters();
    }

    /// Forget everything materialized for the session.
    pub fn reset(&self) {
        self.fail();
        info!(target: "libris::permission", "permission state reset");
    }

    fn clear_routes(&self) {
        *self.routes.write() = RouteForest::new();
        *self.add_routes.write() = RouteForest::new();
    }

    // InFlight -> Empty only; a reset or a newer claim since then wins.
    fn abandon(&self) {
        if self
            .state
            .compare_exchange(
                MaterializeState::InFlight as u8,
                MaterializeState::Empty as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            self.clear_routes();
            warn!(target: "libris::permission", "materialization abandoned, claim released");
        }
        self.settled.notify_waiters();
    }

    /// Wait until no materialization is in flight and return the settled state.
    pub async fn wait_settled(&self) -> MaterializeState {
        loop {
            let notified = self.settled.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            let s = self.state();
            if s != MaterializeState::InFlight {
                return s;
            }
            notified.await;
        }
    }
}

/// Owns a claim won by [`PermissionStore::try_claim`]. Dropping it before
/// `complete` or `fail`, e.g. when the navigation future is dropped mid-await,
/// releases the claim.
#[must_use]
pub struct ClaimGuard<'a> {
    store: &'a PermissionStore,
    settled: bool,
}

impl<'a> ClaimGuard<'a> {
    pub fn new(store: &'a PermissionStore) -> Self { Self { store, settled: false } }

    pub fn complete(mut self) {
        self.settled = true;
        self.store.complete();
    }

    pub fn fail(mut self) {
        self.settled = true;
        self.store.fail();
    }
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.store.abandon();
        }
    }
}

fn filter_into(src: &RouteForest, id: RouteId, roles: &[String], parent: Option<RouteId>, out: &mut RouteForest) {
    let node = src.node(id);
    if !roles_admit(node.meta.role_requirement(), roles) {
        return;
    }
    let kept = out.push(node.clone(), parent);
    for &c in src.children(id) {
        filter_into(src, c, roles, Some(kept), out);
    }
}

impl RouteMaterializer for PermissionStore {
    fn materialize<'a>(&'a self, roles: Option<&'a [String]>) -> BoxFuture<'a, AppResult<RouteForest>> {
        Box::pin(async move {
            let routes = match roles {
                Some(r) => self.set_routes(r),
                None => self.set_all_routes(),
            };
            tokio::task::yield_now().await;
            Ok(routes)
        })
    }
}

#[cfg(test)]
#[path = "permission_tests.rs"]
mod permission_tests;
