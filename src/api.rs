//! Payloads carried in the content of [`crate::packet::Data`] objects.
pub mod api_models;

use base64_serde::base64_serde_type;

base64_serde_type!(pub Base64Standard, base64::engine::general_purpose::STANDARD);
