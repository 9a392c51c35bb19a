//! In-memory gateway used by the provider tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rgw_admin::{
    AdminApi, AdminError, AdminResult, QuotaRequest, QuotaSpec, User, UserKeySpec, UserRequest,
};

use crate::identity::split_identity;

#[derive(Default)]
pub struct FakeAdmin {
    users: Mutex<HashMap<String, User>>,
    calls: Mutex<Vec<String>>,
    modify_requests: Mutex<Vec<UserRequest>>,
    quota_requests: Mutex<Vec<QuotaRequest>>,
    failure: Mutex<Option<(u16, &'static str)>>,
}

impl FakeAdmin {
    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().insert(user.id.clone(), user);
    }

    pub fn user(&self, uid: &str) -> Option<User> {
        self.users.lock().unwrap().get(uid).cloned()
    }

    /// Calls made so far, e.g. `"get_user alice"`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_modify_request(&self) -> Option<UserRequest> {
        self.modify_requests.lock().unwrap().last().cloned()
    }

    pub fn last_quota_request(&self) -> Option<QuotaRequest> {
        self.quota_requests.lock().unwrap().last().cloned()
    }

    /// Make the next call fail with the given status and RGW code
    pub fn fail_next(&self, status: u16, code: &'static str) {
        *self.failure.lock().unwrap() = Some((status, code));
    }

    fn record(&self, call: String) -> AdminResult<()> {
        self.calls.lock().unwrap().push(call);
        match self.failure.lock().unwrap().take() {
            Some((status, code)) => Err(status_error(status, code)),
            None => Ok(()),
        }
    }
}

fn status_error(status: u16, code: &str) -> AdminError {
    AdminError::Status {
        status,
        code: Some(code.to_string()),
        request_id: None,
    }
}

fn no_such_user() -> AdminError {
    status_error(404, "NoSuchUser")
}

fn apply(user: &mut User, request: &UserRequest) {
    if let Some(display_name) = &request.display_name {
        user.display_name = display_name.clone();
    }
    if let Some(email) = &request.email {
        user.email = email.clone();
    }
    if request.suspended.is_some() {
        user.suspended = request.suspended;
    }
    if request.max_buckets.is_some() {
        user.max_buckets = request.max_buckets;
    }
}

#[async_trait]
impl AdminApi for FakeAdmin {
    async fn create_user(&self, request: &UserRequest) -> AdminResult<User> {
        self.record(format!("create_user {}", request.uid))?;
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&request.uid) {
            return Err(status_error(409, "UserAlreadyExists"));
        }

        let (tenant, user_id) = split_identity(&request.uid);
        let mut user = User {
            id: request.uid.clone(),
            tenant: tenant.unwrap_or_default().to_string(),
            suspended: Some(0),
            max_buckets: Some(1000),
            op_mask: "read, write, delete".to_string(),
            default_placement: String::new(),
            bucket_quota: QuotaSpec {
                enabled: Some(false),
                max_size: Some(-1),
                max_objects: Some(-1),
                ..Default::default()
            },
            user_quota: QuotaSpec {
                enabled: Some(false),
                max_size: Some(-1),
                max_objects: Some(-1),
                ..Default::default()
            },
            user_type: "rgw".to_string(),
            ..Default::default()
        };
        apply(&mut user, request);
        if request.generate_key != Some(false) {
            user.keys.push(UserKeySpec {
                user: user_id.to_string(),
                access_key: "AK".to_string(),
                secret_key: "SK".to_string(),
            });
        }
        users.insert(request.uid.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, uid: &str) -> AdminResult<User> {
        self.record(format!("get_user {}", uid))?;
        self.user(uid).ok_or_else(no_such_user)
    }

    async fn modify_user(&self, request: &UserRequest) -> AdminResult<User> {
        self.record(format!("modify_user {}", request.uid))?;
        self.modify_requests.lock().unwrap().push(request.clone());
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&request.uid).ok_or_else(no_such_user)?;
        apply(user, request);
        Ok(user.clone())
    }

    async fn remove_user(&self, uid: &str, purge_data: Option<i64>) -> AdminResult<()> {
        self.record(format!("remove_user {} {:?}", uid, purge_data))?;
        self.users
            .lock()
            .unwrap()
            .remove(uid)
            .map(|_| ())
            .ok_or_else(no_such_user)
    }

    async fn set_user_quota(&self, request: &QuotaRequest) -> AdminResult<()> {
        self.record(format!("set_user_quota {} {}", request.uid, request.quota_type))?;
        self.quota_requests.lock().unwrap().push(request.clone());

        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&request.uid).ok_or_else(no_such_user)?;
        let quota = match request.quota_type.as_str() {
            "user" => &mut user.user_quota,
            _ => &mut user.bucket_quota,
        };
        if request.enabled.is_some() {
            quota.enabled = request.enabled;
        }
        quota.check_on_raw = request.check_on_raw;
        for (field, value) in [
            (&mut quota.max_size, request.max_size),
            (&mut quota.max_size_kb, request.max_size_kb),
            (&mut quota.max_objects, request.max_objects),
        ] {
            if value.is_some() {
                *field = value;
            }
        }
        Ok(())
    }
}
