//! Backend access: the JSON client, response normalization and the account
//! endpoints.

pub mod apis;
pub mod client;
pub mod envelope;

pub use apis::{current_user, login, register, LoginRequest, LoginResponse, RegisterRequest};
pub use client::{ApiClient, UnauthorizedHandler};
pub use envelope::{normalize_error, normalize_response, Envelope, ErrorOutcome, Normalized, NormalizedError, Payload, ResponseBody};
