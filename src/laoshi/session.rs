// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// Durable client state persisted between runs. The bearer credential is
/// deliberately absent: only the cookie-based refresh capability survives
/// the process, and the backend rotates it on every refresh.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Data {
    refresh_cookie: String,
}

impl Data {
    pub(super) fn new<S: Into<String>>(refresh_cookie: S) -> Self {
        Self {
            refresh_cookie: refresh_cookie.into(),
        }
    }

    pub(super) fn refresh_cookie(&self) -> &str {
        &self.refresh_cookie
    }
}
