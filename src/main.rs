// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(elided_lifetimes_in_paths)]
#![warn(
    rust_2018_idioms,
    future_incompatible,
    unused,
    unused_lifetimes,
    unused_qualifications,
    unused_results,
    anonymous_parameters,
    deprecated_in_future,
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    missing_doc_code_examples,
    private_doc_tests,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::unseparated_literal_suffix,
    clippy::decimal_literal_representation,
    clippy::single_char_lifetime_names,
    clippy::fallible_impl_from,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::wildcard_enum_match_arm,
    clippy::deref_by_slicing,
    clippy::default_numeric_fallback,
    clippy::shadow_reuse,
    clippy::clone_on_ref_ptr,
    clippy::todo,
    clippy::string_add,
    clippy::use_debug,
    clippy::future_not_send
)]
#![cfg_attr(not(test), warn(clippy::panic_in_result_fn))]

mod client;
mod command;
mod error;
mod laoshi;
mod metadata;
mod password;
mod practice;
mod storage;

use std::{process, sync::Arc};

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use client::Client;
use error::Result;
use futures_util::lock::Mutex;
use log::{error, warn};
use serde::{Deserialize, Serialize};
use storage::IsPersistent as _;
use url::Url;

#[derive(Debug, Subcommand)]
enum Command {
    Login(command::login::Command),
    Logout(command::logout::Command),
    Whoami(command::whoami::Command),
    Words(command::words::Command),
    Settings(command::settings::Command),
    Practice(command::practice::Command),
}

#[async_trait]
impl command::Command for Command {
    async fn execute(self, client: impl Client + Send + Sync) -> Result<()> {
        match self {
            Self::Login(cmd) => cmd.execute(client).await,
            Self::Logout(cmd) => cmd.execute(client).await,
            Self::Whoami(cmd) => cmd.execute(client).await,
            Self::Words(cmd) => cmd.execute(client).await,
            Self::Settings(cmd) => cmd.execute(client).await,
            Self::Practice(cmd) => cmd.execute(client).await,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// The base URL of the backend API.
    #[arg(long, env = "LAOSHI_URL", default_value = "http://127.0.0.1:5000/api", value_parser = Url::parse)]
    url: Url,

    /// Turn off storing the session on disk. The session then lasts only for
    /// the duration of a single command.
    #[arg(long)]
    no_store_session: bool,

    #[clap(subcommand)]
    command: Command,
}

fn get_session_storage<T: Send + Serialize + Sync + for<'de> Deserialize<'de> + Clone + 'static>(
    args: &Args,
) -> Box<dyn storage::Storage<T>> {
    if !args.no_store_session {
        // Sessions are kept per backend so that switching between servers
        // does not clobber the stored credentials.
        let mut name = format!("session-{}", args.url.host_str().unwrap_or("local"));
        if let Some(port) = args.url.port() {
            name.push_str(&format!("-{port}"));
        }
        name.push_str(".json");

        if let Some(file_storage) = storage::File::new(name) {
            return Box::new(file_storage);
        }
    }

    Box::new(storage::Memory::<T>::new())
}

async fn run(args: Args) -> Result<()> {
    let session_storage = get_session_storage(&args);
    if !args.no_store_session && !session_storage.is_persistent() {
        warn!("We can't find a place to store the session, so it will not outlive this command");
    }

    let client =
        laoshi::Client::connect(args.url.clone(), Arc::new(Mutex::new(session_storage))).await?;

    client.on_credential_loss(|| {
        warn!("The session has expired; log in again with `laoshi login`");
    });

    command::Command::execute(args.command, client).await
}

#[tokio::main]
async fn main() {
    let logger_env = env_logger::Env::new()
        .filter_or("LAOSHI_LOG", "warn")
        .write_style("LAOSHI_LOG_STYLE");
    env_logger::Builder::from_env(logger_env).init();

    if let Err(e) = run(Args::parse()).await {
        error!("We encountered an error: {}", e);
        process::exit(1);
    };
}
