//! RGW Admin
//!
//! Client for the Ceph Object Gateway Admin Ops API, limited to user and
//! quota management.
//!
//! # Overview
//!
//! - **AdminApi**: the operations the provider relies on, as a trait so the
//!   reconciler can be exercised without a live gateway
//! - **RgwAdminClient**: `reqwest` implementation signing every request with
//!   AWS Signature V4
//! - **User / QuotaSpec**: records returned by the gateway
//! - **UserRequest / QuotaRequest**: request records; unset fields are never
//!   sent
//!
//! # Example
//!
//! ```ignore
//! use rgw_admin::{AdminApi, RgwAdminClient, UserRequest};
//!
//! let client = RgwAdminClient::new("http://rgw:8080", "AK", "SK".into(), timeout)?;
//! let user = client
//!     .create_user(&UserRequest::new("alice").with_display_name("Alice"))
//!     .await?;
//! ```

pub mod api;
pub mod client;
pub mod error;
pub mod types;

pub use api::AdminApi;
pub use client::RgwAdminClient;
pub use error::{AdminError, AdminResult};
pub use types::{
    QuotaRequest, QuotaSpec, SubuserSpec, SwiftKeySpec, User, UserCapSpec, UserKeySpec,
    UserRequest,
};
