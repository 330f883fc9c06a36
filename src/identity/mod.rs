//! Session identity for the admin console: who is signed in, with which roles,
//! and the role checks shared by routing and element-level gating.
//! Keep the public surface thin and split implementation across sub-modules.

mod authorizer;
mod principal;
mod session;

pub use authorizer::{check_permission, roles_admit};
pub use principal::{CachedUserInfo, UserInfoPayload, UserType};
pub use session::{Session, SessionEvent, SessionStore};
