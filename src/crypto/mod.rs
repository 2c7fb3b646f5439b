//! Crypto module for browser data decryption
//!
//! Supports Chromium-based browsers and Firefox logins.

pub mod chromium;
pub mod firefox;

pub use chromium::{decrypt as decrypt_chromium_data, decrypt_to_string, is_encrypted};
pub use firefox::decrypt_login_field;
