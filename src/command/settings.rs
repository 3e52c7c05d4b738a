// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use log::error;

use crate::{
    client::{self, Client},
    error::{self, Result},
    password::{self, Prompt as _},
};

/// View and change the account settings.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    #[clap(subcommand)]
    action: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Show the current settings.
    Show(Show),
    /// Change one or more settings.
    Set(Set),
    /// Check an evaluation-model API key against its provider and prompt for
    /// it without echoing.
    ValidateKey(ValidateKey),
}

#[derive(Debug, Parser)]
struct Show {}

#[derive(Debug, Parser)]
struct Set {
    /// The name the tutor should greet you by.
    #[arg(long)]
    preferred_name: Option<String>,

    /// How many words each practice session should cover.
    #[arg(long)]
    words_per_session: Option<u32>,
}

#[derive(Debug, Parser)]
struct ValidateKey {
    /// The provider the key belongs to.
    #[arg(value_enum)]
    provider: client::Provider,
}

fn print_settings(settings: &client::Settings) {
    let configured = |present: bool| if present { "configured" } else { "not configured" };

    println!(
        "Preferred name: {}",
        settings.preferred_name.as_deref().unwrap_or("(not set)")
    );
    match settings.words_per_session {
        Some(count) => println!("Words per session: {count}"),
        None => println!("Words per session: (server default)"),
    }
    println!("DeepSeek key: {}", configured(settings.has_deepseek_key));
    println!("Gemini key: {}", configured(settings.has_gemini_key));
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, client: impl Client + Send + Sync) -> Result<()> {
        match self.action {
            Action::Show(Show {}) => {
                print_settings(&client.settings().await?);
                Ok(())
            }
            Action::Set(set) => {
                let patch = client::SettingsPatch {
                    preferred_name: set.preferred_name,
                    words_per_session: set.words_per_session,
                };
                if patch.is_empty() {
                    error!("Nothing to change; pass at least one of --preferred-name or --words-per-session");
                    return Err(error::Error::Command);
                }

                print_settings(&client.update_settings(&patch).await?);
                Ok(())
            }
            Action::ValidateKey(validate) => {
                let chain = password::default_chain();
                let request =
                    password::RequestBuilder::new(format!("{} API key", validate.provider));
                let Some(key) = chain.prompt(request.into_request()).await? else {
                    return Err(error::Password::NoPrompt.into());
                };

                client.validate_key(validate.provider, &key).await?;
                println!("The {} key is valid.", validate.provider);
                Ok(())
            }
        }
    }
}
