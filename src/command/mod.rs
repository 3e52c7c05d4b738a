// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

use crate::{client::Client, error::Result};

pub(crate) mod login;
pub(crate) mod logout;
pub(crate) mod practice;
pub(crate) mod settings;
pub(crate) mod whoami;
pub(crate) mod words;

#[async_trait]
pub(crate) trait Command {
    async fn execute(self, client: impl Client + Send + Sync) -> Result<()>;
}
