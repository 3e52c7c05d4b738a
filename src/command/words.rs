// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use log::error;
use tabled::{
    settings::{object::Segment, Alignment, Modify, Style},
    Table,
};

use crate::{
    client::{self, Client},
    error::{self, Result},
};

/// Manage the vocabulary list.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    #[clap(subcommand)]
    action: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// List every vocabulary entry.
    List(List),
    /// Add a vocabulary entry.
    Add(Add),
    /// Change an existing vocabulary entry.
    Edit(Edit),
    /// Delete a vocabulary entry.
    Remove(Remove),
    /// Delete every vocabulary entry.
    Clear(Clear),
}

#[derive(Debug, Parser)]
struct List {}

#[derive(Debug, Parser)]
struct Add {
    /// The word in Chinese characters.
    #[clap()]
    word: String,

    /// The pinyin romanization of the word.
    #[clap()]
    pinyin: String,

    /// The English meaning of the word.
    #[clap()]
    meaning: String,

    /// Where the word came from, e.g. a textbook or lesson name.
    #[arg(long, short)]
    source: Option<String>,
}

#[derive(Debug, Parser)]
struct Edit {
    /// The ID of the entry to change.
    #[clap()]
    id: i64,

    /// A new word in Chinese characters.
    #[arg(long)]
    word: Option<String>,

    /// A new pinyin romanization.
    #[arg(long)]
    pinyin: Option<String>,

    /// A new English meaning.
    #[arg(long)]
    meaning: Option<String>,

    /// A new source name.
    #[arg(long)]
    source: Option<String>,
}

#[derive(Debug, Parser)]
struct Remove {
    /// The ID of the entry to delete.
    #[clap()]
    id: i64,
}

#[derive(Debug, Parser)]
struct Clear {
    /// Confirm that every entry should be deleted.
    #[arg(long)]
    force: bool,
}

fn print_words(words: &[client::Word]) {
    if words.is_empty() {
        return;
    }

    println!(
        "{}",
        Table::new(words)
            .with(Style::rounded())
            .with(Modify::new(Segment::new(1.., 1..=3)).with(Alignment::left()))
    );
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, client: impl Client + Send + Sync) -> Result<()> {
        match self.action {
            Action::List(List {}) => {
                print_words(&client.words().await?);
                Ok(())
            }
            Action::Add(add) => {
                let created = client
                    .add_words(&[client::NewWord {
                        word: add.word,
                        pinyin: add.pinyin,
                        meaning: add.meaning,
                        source_name: add.source,
                    }])
                    .await?;
                print_words(&created);
                Ok(())
            }
            Action::Edit(edit) => {
                let patch = client::WordPatch {
                    word: edit.word,
                    pinyin: edit.pinyin,
                    meaning: edit.meaning,
                    source_name: edit.source,
                };
                if patch.is_empty() {
                    error!("Nothing to change; pass at least one of --word, --pinyin, --meaning, or --source");
                    return Err(error::Error::Command);
                }

                let updated = client.update_word(edit.id, &patch).await?;
                print_words(&[updated]);
                Ok(())
            }
            Action::Remove(remove) => {
                client.delete_word(remove.id).await?;
                println!("Removed word {}.", remove.id);
                Ok(())
            }
            Action::Clear(clear) => {
                if !clear.force {
                    error!("Pass --force to delete every vocabulary entry");
                    return Err(error::Error::Command);
                }

                client.clear_words().await?;
                println!("Removed all words.");
                Ok(())
            }
        }
    }
}
