//! Navigation guarding: whitelist, authentication, lazy route materialization,
//! role checks and the after-navigation side effects.

pub mod hooks;
pub mod navigation;
pub mod pipeline;
pub mod whitelist;

pub use hooks::{DocumentTitle, NoopListener, NotificationLog, Notifier, Progress, ProgressIndicator, RouteListener, TitleSink};
pub use navigation::{GuardDecision, GuardHooks, NavigationGuard, Redirect};
pub use pipeline::{NavigationError, NavigationOutcome, Navigator};
pub use whitelist::Whitelist;
