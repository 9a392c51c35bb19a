//! RGW Core
//!
//! Host-facing vocabulary for the RGW provider: attribute values, desired and
//! current resource records, attribute schemas and the Provider trait.

pub mod provider;
pub mod resource;
pub mod schema;
