//! Auth Relay Common Types
//!
//! Shared types for the auth relay: directory records, the identity
//! provider's profile payload, and the JSON bodies of the HTTP API.

pub mod api;
pub mod profile;
pub mod user;

pub use api::{
    AuthRequest, AuthResponse, ErrorResponse, PruneResponse, PublicUser, StatsResponse,
    StatusResponse, UsersResponse,
};
pub use profile::{avatar_url_for, ProfileUpdate, RawProfile, AVATAR_URL_TEMPLATE, NO_EMAIL};
pub use user::{Sex, UserRecord};
