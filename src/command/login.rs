// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::{
    client::Client,
    error::{self, Result},
    password::{self, Prompt as _},
};

/// Log in to the backend and store the session for later commands.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// The username to log in as.
    #[clap()]
    username: String,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, client: impl Client + Send + Sync) -> Result<()> {
        let chain = password::default_chain();
        let mut request = password::RequestBuilder::new("Password");

        let user = loop {
            let Some(password) = chain.prompt(request.into_request()).await? else {
                return Err(error::Password::NoPrompt.into());
            };

            match client.login(&self.username, &password).await {
                Ok(user) => break user,
                Err(err) if err.is_unauthorized() => {
                    request = password::RequestBuilder::new("Password")
                        .with_error("The username or password is incorrect");
                }
                Err(err) => return Err(err),
            }
        };

        println!("Hello, {}!", user.display_name());
        Ok(())
    }
}
