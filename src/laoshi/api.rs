// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use reqwest::Method;
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use serde_json::json;

use crate::{client, error::Result, storage};

use super::{
    gateway::Gateway,
    model, session,
    transport::{Request, Transport},
};

/// One callable backend operation: a request description plus the expected
/// response shape. Execution goes through the gateway so every operation
/// picks up credential attachment and refresh recovery.
#[async_trait]
pub(super) trait Endpoint: Sync {
    type Response: for<'de> Deserialize<'de> + Send;

    fn request(&self) -> Result<Request>;

    async fn execute<T: Transport, S: storage::Storage<session::Data>>(
        &self,
        gateway: &Gateway<T, S>,
    ) -> Result<Self::Response> {
        let resp = gateway.issue(self.request()?).await?;
        resp.check()?;
        Ok(serde_json::from_slice(&resp.body)?)
    }
}

pub(super) struct Login<'req> {
    pub(super) username: &'req str,
    pub(super) password: &'req SecretString,
}

impl Endpoint for Login<'_> {
    type Response = model::Token;

    fn request(&self) -> Result<Request> {
        Ok(Request::new(Method::POST, "credential")
            .with_body(json!({
                "username": self.username,
                "password": self.password.expose_secret(),
            }))
            .exempt())
    }
}

pub(super) struct Revoke;

impl Endpoint for Revoke {
    type Response = model::Ack;

    fn request(&self) -> Result<Request> {
        Ok(Request::new(Method::POST, "credential/revoke").exempt())
    }
}

pub(super) struct Me;

impl Endpoint for Me {
    type Response = model::User;

    fn request(&self) -> Result<Request> {
        Ok(Request::new(Method::GET, "me"))
    }
}

pub(super) struct ListWords;

impl Endpoint for ListWords {
    type Response = Vec<model::Word>;

    fn request(&self) -> Result<Request> {
        Ok(Request::new(Method::GET, "words"))
    }
}

pub(super) struct CreateWords<'req> {
    pub(super) words: &'req [client::NewWord],
}

impl Endpoint for CreateWords<'_> {
    type Response = model::CreatedWords;

    fn request(&self) -> Result<Request> {
        let body = self
            .words
            .iter()
            .map(|word| {
                json!({
                    "word": word.word,
                    "pinyin": word.pinyin,
                    "meaning": word.meaning,
                    "source_name": word.source_name,
                })
            })
            .collect::<Vec<_>>();

        Ok(Request::new(Method::POST, "words").with_body(body.into()))
    }
}

pub(super) struct UpdateWord<'req> {
    pub(super) id: i64,
    pub(super) patch: &'req client::WordPatch,
}

impl Endpoint for UpdateWord<'_> {
    type Response = model::Word;

    fn request(&self) -> Result<Request> {
        let mut body = serde_json::Map::new();
        if let Some(word) = &self.patch.word {
            let _ = body.insert("word".to_owned(), word.clone().into());
        }
        if let Some(pinyin) = &self.patch.pinyin {
            let _ = body.insert("pinyin".to_owned(), pinyin.clone().into());
        }
        if let Some(meaning) = &self.patch.meaning {
            let _ = body.insert("meaning".to_owned(), meaning.clone().into());
        }
        if let Some(source_name) = &self.patch.source_name {
            let _ = body.insert("source_name".to_owned(), source_name.clone().into());
        }

        Ok(Request::new(Method::PUT, format!("words/{}", self.id)).with_body(body.into()))
    }
}

pub(super) struct DeleteWord {
    pub(super) id: i64,
}

impl Endpoint for DeleteWord {
    type Response = model::Ack;

    fn request(&self) -> Result<Request> {
        Ok(Request::new(Method::DELETE, format!("words/{}", self.id)))
    }
}

pub(super) struct ClearWords;

impl Endpoint for ClearWords {
    type Response = model::Ack;

    fn request(&self) -> Result<Request> {
        Ok(Request::new(Method::DELETE, "words"))
    }
}

pub(super) struct GetSettings;

impl Endpoint for GetSettings {
    type Response = model::Settings;

    fn request(&self) -> Result<Request> {
        Ok(Request::new(Method::GET, "settings"))
    }
}

pub(super) struct UpdateSettings<'req> {
    pub(super) patch: &'req client::SettingsPatch,
}

impl Endpoint for UpdateSettings<'_> {
    type Response = model::Settings;

    fn request(&self) -> Result<Request> {
        let mut body = serde_json::Map::new();
        if let Some(preferred_name) = &self.patch.preferred_name {
            let _ = body.insert("preferred_name".to_owned(), preferred_name.clone().into());
        }
        if let Some(words_per_session) = self.patch.words_per_session {
            let _ = body.insert("words_per_session".to_owned(), words_per_session.into());
        }

        Ok(Request::new(Method::PUT, "settings").with_body(body.into()))
    }
}

pub(super) struct ValidateKey<'req> {
    pub(super) provider: client::Provider,
    pub(super) key: &'req SecretString,
}

impl Endpoint for ValidateKey<'_> {
    type Response = model::Ack;

    fn request(&self) -> Result<Request> {
        Ok(Request::new(
            Method::POST,
            format!("settings/keys/{}/validate", self.provider.as_str()),
        )
        .with_body(json!({ "api_key": self.key.expose_secret() })))
    }
}

pub(super) struct StartSession {
    pub(super) words_count: Option<u32>,
}

impl Endpoint for StartSession {
    type Response = model::SessionStart;

    fn request(&self) -> Result<Request> {
        let req = Request::new(Method::POST, "practice/sessions");
        Ok(match self.words_count {
            // Omitted entirely when unset so the backend falls back to the
            // profile's words_per_session.
            Some(count) => req.with_body(json!({ "words_count": count })),
            None => req,
        })
    }
}

pub(super) struct SendMessage<'req> {
    pub(super) session_id: i64,
    pub(super) message: &'req str,
}

impl Endpoint for SendMessage<'_> {
    type Response = model::Exchange;

    fn request(&self) -> Result<Request> {
        Ok(Request::new(
            Method::POST,
            format!("practice/sessions/{}/messages", self.session_id),
        )
        .with_body(json!({ "message": self.message })))
    }
}

pub(super) struct NextWord {
    pub(super) session_id: i64,
}

impl Endpoint for NextWord {
    type Response = model::Exchange;

    fn request(&self) -> Result<Request> {
        Ok(Request::new(
            Method::POST,
            format!("practice/sessions/{}/next-word", self.session_id),
        ))
    }
}

pub(super) struct GetSummary {
    pub(super) session_id: i64,
}

impl Endpoint for GetSummary {
    type Response = model::Summary;

    fn request(&self) -> Result<Request> {
        Ok(Request::new(
            Method::GET,
            format!("practice/sessions/{}/summary", self.session_id),
        ))
    }
}
