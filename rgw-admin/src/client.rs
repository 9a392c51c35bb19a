//! HTTP implementation of the Admin Ops API

use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{
    PayloadChecksumKind, SignableBody, SignableRequest, SigningParams, SigningSettings, sign,
};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use log::debug;
use reqwest::{Client, Method, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::api::AdminApi;
use crate::error::{AdminError, AdminResult};
use crate::types::{QuotaRequest, User, UserRequest};

/// RGW validates admin requests as S3 requests
const SIGNING_SERVICE: &str = "s3";
const SIGNING_REGION: &str = "us-east-1";

/// Error document returned by RGW on failure
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "Code")]
    code: Option<String>,
    #[serde(rename = "RequestId")]
    request_id: Option<String>,
}

/// Admin Ops client
///
/// The client is immutable after construction and can be shared between
/// tasks.
pub struct RgwAdminClient {
    http: Client,
    endpoint: Url,
    access_key: String,
    secret_key: SecretString,
}

impl RgwAdminClient {
    /// Create a client for the gateway at `endpoint` (e.g., `http://rgw:8080`)
    pub fn new(
        endpoint: &str,
        access_key: impl Into<String>,
        secret_key: SecretString,
        timeout: Duration,
    ) -> AdminResult<Self> {
        let invalid = |reason: &str| AdminError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        };

        let parsed = Url::parse(endpoint).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if parsed.cannot_be_a_base() || parsed.host_str().is_none() {
            return Err(invalid("missing host"));
        }

        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            endpoint: parsed,
            access_key: access_key.into(),
            secret_key,
        })
    }

    /// Endpoint the client talks to
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Build `{endpoint}/admin/user?format=json&...`
    fn user_url(&self, quota: bool, pairs: &[(&'static str, String)]) -> AdminResult<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| AdminError::InvalidEndpoint {
                endpoint: self.endpoint.to_string(),
                reason: "missing host".to_string(),
            })?
            .pop_if_empty()
            .extend(["admin", "user"]);
        {
            let mut query = url.query_pairs_mut();
            if quota {
                query.append_key_only("quota");
            }
            query.append_pair("format", "json");
            for (key, value) in pairs {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Host header value, matching what the signer canonicalizes
    fn host_header(url: &Url) -> String {
        let host = url.host_str().unwrap_or_default();
        match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    /// Compute SigV4 headers for a bodiless request
    fn sign(&self, method: &Method, url: &Url, host: &str) -> AdminResult<Vec<(String, String)>> {
        let identity: Identity = Credentials::new(
            self.access_key.clone(),
            self.secret_key.expose_secret().to_string(),
            None,
            None,
            "rgw-admin",
        )
        .into();

        let mut settings = SigningSettings::default();
        settings.payload_checksum_kind = PayloadChecksumKind::XAmzSha256;

        let params: SigningParams<'_> = v4::SigningParams::builder()
            .identity(&identity)
            .region(SIGNING_REGION)
            .name(SIGNING_SERVICE)
            .time(SystemTime::now())
            .settings(settings)
            .build()
            .map_err(AdminError::signing)?
            .into();

        let signable = SignableRequest::new(
            method.as_str(),
            url.as_str(),
            [("host", host)].into_iter(),
            SignableBody::Bytes(&[]),
        )
        .map_err(AdminError::signing)?;

        let (instructions, _signature) = sign(signable, &params)
            .map_err(AdminError::signing)?
            .into_parts();

        Ok(instructions
            .headers()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect())
    }

    /// Send a signed request and return the response body on success
    async fn call(&self, method: Method, url: Url) -> AdminResult<Vec<u8>> {
        debug!("{} {}", method, url.path());

        let host = Self::host_header(&url);
        let headers = self.sign(&method, &url, &host)?;

        let mut request = self
            .http
            .request(method.clone(), url)
            .header(reqwest::header::HOST, host);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status.is_success() {
            return Ok(body.to_vec());
        }

        let error = serde_json::from_slice::<ErrorBody>(&body).ok();
        debug!(
            "{} failed with status {} ({:?})",
            method,
            status.as_u16(),
            error.as_ref().and_then(|e| e.code.as_deref())
        );
        Err(AdminError::Status {
            status: status.as_u16(),
            code: error.as_ref().and_then(|e| e.code.clone()),
            request_id: error.and_then(|e| e.request_id),
        })
    }
}

#[async_trait]
impl AdminApi for RgwAdminClient {
    async fn create_user(&self, request: &UserRequest) -> AdminResult<User> {
        let url = self.user_url(false, &request.query_pairs())?;
        let body = self.call(Method::PUT, url).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get_user(&self, uid: &str) -> AdminResult<User> {
        let url = self.user_url(false, &[("uid", uid.to_string())])?;
        let body = self.call(Method::GET, url).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn modify_user(&self, request: &UserRequest) -> AdminResult<User> {
        let url = self.user_url(false, &request.query_pairs())?;
        let body = self.call(Method::POST, url).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn remove_user(&self, uid: &str, purge_data: Option<i64>) -> AdminResult<()> {
        let mut pairs = vec![("uid", uid.to_string())];
        if let Some(purge) = purge_data {
            pairs.push(("purge-data", purge.to_string()));
        }
        let url = self.user_url(false, &pairs)?;
        self.call(Method::DELETE, url).await?;
        Ok(())
    }

    async fn set_user_quota(&self, request: &QuotaRequest) -> AdminResult<()> {
        let url = self.user_url(true, &request.query_pairs())?;
        self.call(Method::PUT, url).await?;
        Ok(())
    }
}
