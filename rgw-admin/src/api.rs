//! AdminApi trait

use async_trait::async_trait;

use crate::error::AdminResult;
use crate::types::{QuotaRequest, User, UserRequest};

/// User and quota operations of the Admin Ops API
///
/// Every call is a single round trip. Implementations must be safe for
/// concurrent use; dropping a returned future abandons the request.
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Create a user (`PUT /admin/user`)
    async fn create_user(&self, request: &UserRequest) -> AdminResult<User>;

    /// Get user information (`GET /admin/user`)
    ///
    /// `uid` may be tenant-qualified (`tenant$uid`).
    async fn get_user(&self, uid: &str) -> AdminResult<User>;

    /// Modify a user (`POST /admin/user`)
    async fn modify_user(&self, request: &UserRequest) -> AdminResult<User>;

    /// Remove a user (`DELETE /admin/user`), optionally purging its data
    async fn remove_user(&self, uid: &str, purge_data: Option<i64>) -> AdminResult<()>;

    /// Set the user or bucket quota of a user (`PUT /admin/user?quota`)
    ///
    /// There is no quota removal endpoint; disabling is done through this
    /// call with `enabled=false`.
    async fn set_user_quota(&self, request: &QuotaRequest) -> AdminResult<()>;
}
