// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::task;

use crate::error::Result;

#[derive(Debug, Clone)]
pub(crate) struct Request {
    label: String,
    error: Option<String>,
}

pub(crate) struct RequestBuilder {
    label: String,
    error: Option<String>,
}

impl RequestBuilder {
    pub(crate) fn new<S: Into<String>>(label: S) -> Self {
        Self {
            label: label.into(),
            error: None,
        }
    }

    pub(crate) fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_owned());
        self
    }

    pub(crate) fn into_request(self) -> Request {
        Request {
            label: self.label,
            error: self.error,
        }
    }
}

#[async_trait]
pub(crate) trait Prompt: Send + Sync {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>>;
}

#[async_trait]
impl<T: Prompt + ?Sized> Prompt for Box<T> {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        (**self).prompt(req).await
    }
}

#[async_trait]
impl<T: Prompt> Prompt for Vec<T> {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        for candidate in self {
            if let r @ (Ok(Some(_)) | Err(_)) = candidate.prompt(req.clone()).await {
                return r;
            }
        }

        Ok(None)
    }
}

/// The interactive prompt backends to try, in order of preference.
pub(crate) fn default_chain() -> Vec<Box<dyn Prompt>> {
    vec![Box::new(RpasswordPrompt)]
}

pub(crate) struct RpasswordPrompt;

#[async_trait]
impl Prompt for RpasswordPrompt {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        if let Some(error) = req.error {
            eprintln!("Error: {error}");
        }

        Ok(Some(
            task::spawn_blocking(move || {
                rpassword::prompt_password(format!("{}: ", req.label)).map(SecretString::new)
            })
            .await??,
        ))
    }
}
