//! Attribute-based access control for named data.
//!
//! An [`attribute_authority::AttributeAuthority`] derives per-identity decryption keys from its
//! master secret and the attributes (CP-ABE) or access formula (KP-ABE) registered for each
//! identity, and delivers them envelope-encrypted and segmented over a [`face::Face`]. A
//! [`consumer::Consumer`] fetches the public parameters and its own key, then fetches, validates
//! and decrypts protected content.
pub mod abe_attribute;
pub mod abe_support;
pub mod access_tree;
pub mod aes;
pub mod algo;
pub mod api;
pub mod attribute_authority;
pub mod config;
pub mod consumer;
pub mod crypto;
pub mod errors;
pub mod face;
pub mod fetch;
pub mod models;
pub mod name;
pub mod packet;
pub mod parser;
pub mod security;

pub use errors::{Error, ErrorKind, Result};
