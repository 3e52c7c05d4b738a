// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::{client::Client, error::Result};

/// Revoke the current session and forget the stored credentials.
#[derive(Debug, Parser)]
pub(crate) struct Command {}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, client: impl Client + Send + Sync) -> Result<()> {
        client.logout().await?;
        println!("Logged out.");
        Ok(())
    }
}
