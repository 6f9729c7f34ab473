// Local accounts with Argon2id password hashes.

pub mod handlers;
pub mod password;
pub mod service;

pub use service::{LoginRequest, PasswordChange, ProfileUpdate, RegisterRequest};
