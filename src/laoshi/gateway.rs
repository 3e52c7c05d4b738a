// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{
    collections::VecDeque,
    mem,
    sync::{Arc, Mutex as SyncMutex, PoisonError},
};

use futures_util::lock::Mutex as StorageMutex;
use log::{debug, warn};
use reqwest::Method;
use secrecy::SecretString;
use tokio::sync::{oneshot, Mutex};

use crate::{
    error::{self, Error, Result},
    storage,
};

use super::{
    model, session,
    transport::{CookieUpdate, Request, Response, Transport},
};

type LossCallback = Box<dyn Fn() + Send + Sync>;

/// A request that received an authorization failure while a refresh was
/// already in flight. Resolved or rejected exactly once when the queue is
/// drained.
struct Pending {
    req: Request,
    tx: oneshot::Sender<Result<Response>>,
}

#[derive(Default)]
struct Refresh {
    in_flight: bool,
    pending: VecDeque<Pending>,
}

/// Issues HTTP requests with the current bearer credential attached,
/// transparently refreshing the credential once per expiry event and
/// replaying affected requests in arrival order.
pub(super) struct Gateway<T: Transport, S: storage::Storage<session::Data>> {
    transport: T,
    storage: Arc<StorageMutex<S>>,
    credential: SyncMutex<Option<SecretString>>,
    refresh_cookie: SyncMutex<Option<String>>,
    refresh: Mutex<Refresh>,
    on_loss: SyncMutex<Option<LossCallback>>,
}

impl<T: Transport, S: storage::Storage<session::Data>> Gateway<T, S> {
    pub(super) fn new(transport: T, storage: Arc<StorageMutex<S>>) -> Self {
        Self {
            transport,
            storage,
            credential: SyncMutex::new(None),
            refresh_cookie: SyncMutex::new(None),
            refresh: Mutex::new(Refresh::default()),
            on_loss: SyncMutex::new(None),
        }
    }

    /// Loads the persisted refresh capability, if any. The bearer credential
    /// always starts out empty; the first authenticated request will mint one
    /// through the refresh flow.
    pub(super) async fn restore(&self) -> Result<()> {
        let data = self.storage.lock().await.get().await?;
        if let Some(data) = data {
            self.set_refresh_cookie(Some(data.refresh_cookie().to_owned()));
        }
        Ok(())
    }

    pub(super) fn set_credential(&self, credential: Option<SecretString>) {
        *self
            .credential
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = credential;
    }

    fn credential(&self) -> Option<SecretString> {
        self.credential
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_refresh_cookie(&self, cookie: Option<String>) {
        *self
            .refresh_cookie
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = cookie;
    }

    fn refresh_cookie(&self) -> Option<String> {
        self.refresh_cookie
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(super) fn on_credential_loss<F: Fn() + Send + Sync + 'static>(&self, callback: F) {
        *self.on_loss.lock().unwrap_or_else(PoisonError::into_inner) = Some(Box::new(callback));
    }

    /// Drops both the in-memory credential and the durable refresh
    /// capability.
    pub(super) async fn forget_session(&self) {
        self.set_credential(None);
        self.set_refresh_cookie(None);
        if let Err(e) = self.storage.lock().await.clear().await {
            warn!("We couldn't remove the stored session: {}", e);
        }
    }

    /// Sends a request with the current credential attached. Responses that
    /// rotate or clear the refresh cookie update the stored capability as a
    /// side effect.
    async fn send(&self, req: &Request) -> Result<Response> {
        let mut attempt = req.clone();
        attempt.bearer = self.credential();
        if attempt.refresh_exempt {
            attempt.cookie = self.refresh_cookie();
        }

        let resp = self.transport.send(&attempt).await?;

        match &resp.refresh_cookie {
            Some(CookieUpdate::Set(cookie)) => {
                self.set_refresh_cookie(Some(cookie.clone()));
                if let Err(e) = self
                    .storage
                    .lock()
                    .await
                    .update(&session::Data::new(cookie.clone()))
                    .await
                {
                    warn!("We couldn't persist the refresh capability: {}", e);
                }
            }
            Some(CookieUpdate::Clear) => {
                self.set_refresh_cookie(None);
                if let Err(e) = self.storage.lock().await.clear().await {
                    warn!("We couldn't remove the stored refresh capability: {}", e);
                }
            }
            None => {}
        }

        Ok(resp)
    }

    /// Issues a request, recovering from a credential expiry at most once.
    pub(super) async fn issue(&self, req: Request) -> Result<Response> {
        let resp = self.send(&req).await?;
        if !resp.is_unauthorized() || req.refresh_exempt {
            return Ok(resp);
        }

        self.recover(req).await
    }

    /// The single-flight refresh cycle. The first expired request performs
    /// the refresh; requests that expire while it is in flight are queued and
    /// replayed, in arrival order, after the triggering request.
    async fn recover(&self, req: Request) -> Result<Response> {
        let waiter = {
            let mut refresh = self.refresh.lock().await;
            if refresh.in_flight {
                let (tx, rx) = oneshot::channel();
                refresh.pending.push_back(Pending {
                    req: req.clone(),
                    tx,
                });
                Some(rx)
            } else {
                refresh.in_flight = true;
                None
            }
        };

        if let Some(rx) = waiter {
            return rx.await.map_err(error::Internal::from)?;
        }

        let outcome = self.refresh_credential().await;

        // The in-flight flag must clear before any replay so that a later
        // expiry can start a fresh cycle.
        let pending = {
            let mut refresh = self.refresh.lock().await;
            refresh.in_flight = false;
            mem::take(&mut refresh.pending)
        };

        match outcome {
            Ok(()) => {
                debug!(
                    "Credential refreshed; replaying {} request(s)",
                    pending.len() + 1
                );

                let result = self.send(&req).await;
                for entry in pending {
                    let replay = self.send(&entry.req).await;
                    if entry.tx.send(replay).is_err() {
                        warn!("Failed to inform disconnected caller of replayed response");
                    }
                }
                result
            }
            Err(err) => {
                debug!("Credential refresh failed; rejecting {} queued request(s)", pending.len());

                self.set_credential(None);
                for entry in pending {
                    if entry.tx.send(Err(Self::queue_error(&err))).is_err() {
                        warn!("Failed to inform disconnected caller of refresh failure");
                    }
                }

                let guard = self.on_loss.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(callback) = guard.as_ref() {
                    callback();
                }

                Err(err)
            }
        }
    }

    async fn refresh_credential(&self) -> Result<()> {
        let req = Request::new(Method::POST, "credential/refresh").exempt();
        let resp = self.send(&req).await?;
        resp.check()?;

        let token: model::Token = serde_json::from_slice(&resp.body)?;
        self.set_credential(Some(token.access_token));
        Ok(())
    }

    // The refresh error itself is not clonable, so queued callers receive its
    // API-level summary instead.
    fn queue_error(err: &Error) -> Error {
        match err {
            Error::Api(api) => Error::Api(api.clone()),
            // LINT: Deliberate fall-through that should catch future cases
            // added to the enum.
            #[allow(clippy::wildcard_enum_match_arm)]
            _ => Error::Api(error::Api::Unauthorized),
        }
    }
}
