//! Request executor

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use super::digest::{authorization, digest_challenge};
use super::{Credentials, DEFAULT_API_URL, USER_AGENT};
use crate::error::{CoreError, Result};

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Status code and body of one response
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Body as (lossy) UTF-8 text
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body into `T`
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|source| CoreError::Decode {
            source,
            body: self.text(),
        })
    }
}

/// Builder for [`ApiClient`]
#[derive(Debug, Clone)]
pub struct ApiClientBuilder {
    credentials: Option<Credentials>,
    base_url: String,
    timeout: Duration,
    user_agent: String,
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self {
            credentials: None,
            base_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl ApiClientBuilder {
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let credentials = self
            .credentials
            .ok_or_else(|| CoreError::Validation("credentials are required".to_string()))?;

        let base_url = Url::parse(self.base_url.trim_end_matches('/')).map_err(|e| {
            CoreError::Config(format!("invalid API URL '{}': {}", self.base_url, e))
        })?;

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .build()?;

        debug!(base_url = %base_url, timeout = ?self.timeout, "API client created");

        Ok(ApiClient {
            http,
            credentials,
            base_url,
        })
    }
}

/// Shared, read-only authenticated transport
///
/// Every call is a single attempt: the digest handshake may cost one extra
/// round trip, but a failed request is never retried here.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    credentials: Credentials,
    base_url: Url,
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Fully qualified URL for an API path such as `/api/v1beta/projects`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Send one request and classify the response.
    ///
    /// Only `200 OK` counts as success. Any other status, including 201 and
    /// 204, becomes [`CoreError::Api`] carrying the status and raw body.
    pub async fn execute<B>(
        &self,
        method: Method,
        url: &str,
        payload: Option<&B>,
    ) -> Result<RawResponse>
    where
        B: Serialize + ?Sized,
    {
        let target = Url::parse(url)
            .map_err(|e| CoreError::Validation(format!("invalid URL '{}': {}", url, e)))?;

        let body = payload
            .map(serde_json::to_vec)
            .transpose()
            .map_err(CoreError::Encode)?;

        debug!(
            method = %method,
            url = %target,
            payload = %body.as_deref().map(String::from_utf8_lossy).unwrap_or_default(),
            "request"
        );

        let mut response = self.send(&method, &target, body.as_deref(), None).await?;

        if response.status() == StatusCode::UNAUTHORIZED
            && let Some(challenge) = digest_challenge(response.headers())
        {
            trace!(url = %target, "answering digest challenge");
            let header = authorization(
                &challenge,
                &self.credentials,
                &method,
                &target,
                body.as_deref(),
            )?;
            response = self
                .send(&method, &target, body.as_deref(), Some(&header))
                .await?;
        }

        let status = response.status();
        let raw = RawResponse {
            status,
            body: response.bytes().await?.to_vec(),
        };

        debug!(
            method = %method,
            url = %target,
            status = status.as_u16(),
            response = %raw.text(),
            "response"
        );

        if status != StatusCode::OK {
            return Err(CoreError::Api {
                status: status.as_u16(),
                body: raw.text(),
            });
        }

        Ok(raw)
    }

    /// [`execute`](Self::execute), then decode the body into `T`
    pub async fn execute_into<B, T>(
        &self,
        method: Method,
        url: &str,
        payload: Option<&B>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(method, url, payload).await?.json()
    }

    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.execute_into(Method::GET, url, None::<&()>).await
    }

    pub async fn post<B, T>(&self, url: &str, payload: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute_into(Method::POST, url, Some(payload)).await
    }

    pub async fn patch<B>(&self, url: &str, payload: &B) -> Result<RawResponse>
    where
        B: Serialize + ?Sized,
    {
        self.execute(Method::PATCH, url, Some(payload)).await
    }

    pub async fn delete(&self, url: &str) -> Result<RawResponse> {
        self.execute(Method::DELETE, url, None::<&()>).await
    }

    async fn send(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&[u8]>,
        authorization: Option<&str>,
    ) -> Result<reqwest::Response> {
        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header(ACCEPT, "application/json");

        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_vec());
        }
        if let Some(authorization) = authorization {
            request = request.header(AUTHORIZATION, authorization);
        }

        Ok(request.send().await?)
    }
}
