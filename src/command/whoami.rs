// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::{client::Client, error::Result};

/// Show the account the current session belongs to.
#[derive(Debug, Parser)]
pub(crate) struct Command {}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, client: impl Client + Send + Sync) -> Result<()> {
        let user = client.me().await?;

        println!("ID: {}", user.id);
        if let Some(username) = &user.username {
            println!("Username: {username}");
        }
        if let Some(preferred_name) = &user.preferred_name {
            println!("Preferred name: {preferred_name}");
        }
        Ok(())
    }
}
