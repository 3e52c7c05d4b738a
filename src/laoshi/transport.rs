// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use reqwest::{header, Method, StatusCode};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use url::Url;

use crate::{
    error::{self, Result},
    metadata,
};

/// The cookie the backend uses to carry the refresh capability.
pub(super) const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// One HTTP call to the backend, described independently of the transport so
/// that the gateway can replay it after a credential refresh.
#[derive(Clone, Debug)]
pub(crate) struct Request {
    pub(super) method: Method,
    /// Path relative to the base URL, without a leading slash.
    pub(super) path: String,
    pub(super) body: Option<serde_json::Value>,
    /// Credential endpoints authenticate with the refresh cookie and must
    /// never trigger a refresh themselves.
    pub(super) refresh_exempt: bool,
    pub(super) bearer: Option<SecretString>,
    pub(super) cookie: Option<String>,
}

impl Request {
    pub(super) fn new<P: Into<String>>(method: Method, path: P) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            refresh_exempt: false,
            bearer: None,
            cookie: None,
        }
    }

    pub(super) fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub(super) fn exempt(mut self) -> Self {
        self.refresh_exempt = true;
        self
    }
}

/// A change to the stored refresh capability observed on a response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum CookieUpdate {
    Set(String),
    Clear,
}

#[derive(Clone, Debug)]
pub(crate) struct Response {
    pub(super) status: u16,
    pub(super) body: Vec<u8>,
    pub(super) refresh_cookie: Option<CookieUpdate>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

impl Response {
    pub(super) const fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED.as_u16()
    }

    fn message(&self) -> String {
        if let Ok(ErrorBody { error: Some(msg) }) = serde_json::from_slice(&self.body) {
            return msg;
        }

        let text = String::from_utf8_lossy(&self.body);
        // Truncated by characters, not bytes, so multibyte text stays intact.
        text.trim().chars().take(200).collect()
    }

    /// Maps a non-success status onto the API error taxonomy.
    pub(super) fn check(&self) -> Result<()> {
        match self.status {
            200..=299 => Ok(()),
            401 => Err(error::Api::Unauthorized.into()),
            400 | 422 => Err(error::Api::Validation {
                message: self.message(),
            }
            .into()),
            403 | 404 => Err(error::Api::NotFound {
                message: self.message(),
            }
            .into()),
            status => Err(error::Api::Server {
                status,
                message: self.message(),
            }
            .into()),
        }
    }
}

#[async_trait]
pub(crate) trait Transport: Send + Sync {
    async fn send(&self, req: &Request) -> Result<Response>;
}

pub(crate) struct ReqwestTransport {
    base: Url,
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub(crate) fn new(mut base: Url) -> Result<Self> {
        // Relative joins drop the last path segment of a base URL that lacks
        // a trailing slash, which would silently strip a prefix like /api.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            base,
            http: reqwest::Client::builder()
                .user_agent(metadata::CLIENT_USER_AGENT.clone())
                .build()?,
        })
    }

    fn refresh_cookie_update(resp: &reqwest::Response) -> Option<CookieUpdate> {
        for value in resp.headers().get_all(header::SET_COOKIE) {
            let Ok(text) = value.to_str() else { continue };
            let Some(rest) = text.strip_prefix(REFRESH_COOKIE_NAME) else {
                continue;
            };
            let Some(rest) = rest.strip_prefix('=') else {
                continue;
            };

            let cookie_value = rest.split(';').next().unwrap_or("").trim();
            return if cookie_value.is_empty() {
                Some(CookieUpdate::Clear)
            } else {
                Some(CookieUpdate::Set(format!(
                    "{REFRESH_COOKIE_NAME}={cookie_value}"
                )))
            };
        }

        None
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, req: &Request) -> Result<Response> {
        let url = self.base.join(&req.path)?;
        let mut builder = self.http.request(req.method.clone(), url);

        if let Some(bearer) = &req.bearer {
            builder = builder.header(
                header::AUTHORIZATION,
                format!("Bearer {}", bearer.expose_secret()),
            );
        }
        if let Some(cookie) = &req.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let refresh_cookie = Self::refresh_cookie_update(&resp);
        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();

        Ok(Response {
            status,
            body,
            refresh_cookie,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> Response {
        Response {
            status,
            body: body.as_bytes().to_vec(),
            refresh_cookie: None,
        }
    }

    #[test]
    fn check_maps_statuses_onto_taxonomy() {
        assert!(response(200, "{}").check().is_ok());
        assert!(response(201, "{}").check().is_ok());

        assert!(response(401, "{}").check().is_err_and(|e| e.is_unauthorized()));

        match response(400, r#"{"error": "sentence is required"}"#).check() {
            Err(crate::error::Error::Api(error::Api::Validation { message })) => {
                assert_eq!(message, "sentence is required");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        match response(500, "oops").check() {
            Err(crate::error::Error::Api(error::Api::Server { status, message })) => {
                assert_eq!(status, 500);
                assert_eq!(message, "oops");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn check_truncates_long_multibyte_bodies() {
        let body = "好".repeat(300);

        match response(502, &body).check() {
            Err(crate::error::Error::Api(error::Api::Server { status, message })) => {
                assert_eq!(status, 502);
                assert_eq!(message.chars().count(), 200);
                assert!(message.chars().all(|c| c == '好'));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
