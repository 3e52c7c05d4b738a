// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

mod api;
mod gateway;
mod model;
pub(crate) mod session;
mod transport;

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::lock::Mutex;
use secrecy::SecretString;
use url::Url;

use crate::{client, error::Result, storage};

use api::Endpoint as _;

/// The production backend client: typed endpoints executed through the
/// authenticated gateway.
pub(crate) struct Client<T: transport::Transport, S: storage::Storage<session::Data>> {
    gateway: gateway::Gateway<T, S>,
}

impl<S: storage::Storage<session::Data>> Client<transport::ReqwestTransport, S> {
    pub(crate) async fn connect(base: Url, storage: Arc<Mutex<S>>) -> Result<Self> {
        Self::with_transport(transport::ReqwestTransport::new(base)?, storage).await
    }
}

impl<T: transport::Transport, S: storage::Storage<session::Data>> Client<T, S> {
    async fn with_transport(transport: T, storage: Arc<Mutex<S>>) -> Result<Self> {
        let gateway = gateway::Gateway::new(transport, storage);
        gateway.restore().await?;
        Ok(Self { gateway })
    }

    pub(crate) fn on_credential_loss<F: Fn() + Send + Sync + 'static>(&self, callback: F) {
        self.gateway.on_credential_loss(callback);
    }
}

#[async_trait]
impl<T: transport::Transport, S: storage::Storage<session::Data>> client::Client
    for Client<T, S>
{
    async fn login(&self, username: &str, password: &SecretString) -> Result<client::User> {
        let token = api::Login { username, password }
            .execute(&self.gateway)
            .await?;
        self.gateway.set_credential(Some(token.access_token));

        Ok(api::Me.execute(&self.gateway).await?.into())
    }

    async fn logout(&self) -> Result<()> {
        let result = api::Revoke.execute(&self.gateway).await;
        self.gateway.forget_session().await;

        match result {
            Ok(_) => Ok(()),
            // An expired or already-revoked refresh capability means there is
            // nothing left to revoke on the server.
            Err(err) if err.is_unauthorized() => Ok(()),
            Err(err) => Err(err),
        }
    }

    async fn me(&self) -> Result<client::User> {
        Ok(api::Me.execute(&self.gateway).await?.into())
    }

    async fn words(&self) -> Result<Vec<client::Word>> {
        Ok(api::ListWords
            .execute(&self.gateway)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn add_words(&self, words: &[client::NewWord]) -> Result<Vec<client::Word>> {
        Ok(api::CreateWords { words }
            .execute(&self.gateway)
            .await?
            .created_data
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn update_word(&self, id: i64, patch: &client::WordPatch) -> Result<client::Word> {
        Ok(api::UpdateWord { id, patch }
            .execute(&self.gateway)
            .await?
            .into())
    }

    async fn delete_word(&self, id: i64) -> Result<()> {
        let _ = api::DeleteWord { id }.execute(&self.gateway).await?;
        Ok(())
    }

    async fn clear_words(&self) -> Result<()> {
        let _ = api::ClearWords.execute(&self.gateway).await?;
        Ok(())
    }

    async fn settings(&self) -> Result<client::Settings> {
        Ok(api::GetSettings.execute(&self.gateway).await?.into())
    }

    async fn update_settings(&self, patch: &client::SettingsPatch) -> Result<client::Settings> {
        Ok(api::UpdateSettings { patch }
            .execute(&self.gateway)
            .await?
            .into())
    }

    async fn validate_key(&self, provider: client::Provider, key: &SecretString) -> Result<()> {
        let _ = api::ValidateKey { provider, key }
            .execute(&self.gateway)
            .await?;
        Ok(())
    }

    async fn start_session(&self, words_count: Option<u32>) -> Result<client::SessionStart> {
        Ok(api::StartSession { words_count }
            .execute(&self.gateway)
            .await?
            .into())
    }

    async fn send_sentence(&self, session_id: i64, sentence: &str) -> Result<client::Exchange> {
        Ok(api::SendMessage {
            session_id,
            message: sentence,
        }
        .execute(&self.gateway)
        .await?
        .into())
    }

    async fn next_word(&self, session_id: i64) -> Result<client::Exchange> {
        Ok(api::NextWord { session_id }.execute(&self.gateway).await?.into())
    }

    async fn summary(&self, session_id: i64) -> Result<client::Summary> {
        Ok(api::GetSummary { session_id }
            .execute(&self.gateway)
            .await?
            .into())
    }
}
