// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::error;
use tabled::{settings::Style, Table};
use tokio::io::{self, AsyncBufReadExt as _, BufReader};

use crate::{
    client::{self, Client},
    error::{self, Result},
    practice::{Controller, Phase, Sender},
};

/// Practice vocabulary in an interactive session with the tutor.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// How many words to practice. Defaults to the account's words-per-session
    /// setting.
    #[arg(long, short)]
    words: Option<u32>,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, client: impl Client + Send + Sync) -> Result<()> {
        let mut controller = Controller::new();
        let mut lines = BufReader::new(io::stdin()).lines();

        'session: loop {
            if controller.start(&client, self.words).await.is_err() {
                if let Some(message) = controller.start_error() {
                    error!("We can't start a practice session: {message}");
                }
                return Err(error::Error::Command);
            }

            println!("Type a sentence using the word, /skip to move on, or /quit to stop.");
            println!();
            let mut rendered = render(&controller, 0);

            loop {
                match controller.phase() {
                    Phase::Completed => break,
                    Phase::Initializing | Phase::Practicing => {}
                }

                prompt()?;
                let Some(line) = lines.next_line().await? else {
                    break 'session;
                };

                let input = line.trim();
                match input {
                    "" => continue,
                    "/quit" | "/q" => break 'session,
                    "/skip" | "/s" => controller.advance(&client).await?,
                    _ => controller.submit(&client, input).await?,
                }

                rendered = render(&controller, rendered);
            }

            print_summary(&controller);

            println!("Type /again for another session, or press Enter to finish.");
            prompt()?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            if line.trim() != "/again" {
                break;
            }

            controller.reset();
        }

        Ok(())
    }
}

fn prompt() -> Result<()> {
    use std::io::Write as _;

    let mut stdout = std::io::stdout();
    write!(stdout, "> ")?;
    stdout.flush()?;
    Ok(())
}

/// Prints the transcript entries added since the last call, followed by the
/// current word card and progress line. Returns the new high-water mark.
fn render(controller: &Controller, from: usize) -> usize {
    let transcript = controller.transcript();
    for message in transcript.iter().skip(from) {
        match message.sender {
            // The learner's own line is already on screen.
            Sender::Learner => {}
            Sender::Tutor => {
                println!("老师: {}", message.text);
                if let Some(feedback) = &message.feedback {
                    print_feedback(feedback);
                }
            }
        }
    }

    match controller.phase() {
        Phase::Practicing => {
            if let Some(word) = controller.current_word() {
                println!();
                println!("Word: {} ({}) - {}", word.word, word.pinyin, word.meaning);
            }

            let progress = controller.progress();
            println!(
                "Progress: {} practiced, {} skipped, {} total",
                progress.practiced, progress.skipped, progress.total
            );
            println!();
        }
        Phase::Initializing | Phase::Completed => {}
    }

    transcript.len()
}

fn print_feedback(feedback: &client::Feedback) {
    println!(
        "  Grammar: {:.1}  Usage: {:.1}  Naturalness: {:.1}  ({})",
        feedback.grammar_score,
        feedback.usage_score,
        feedback.naturalness_score,
        if feedback.is_correct {
            "correct"
        } else {
            "needs work"
        },
    );
    if let Some(text) = &feedback.feedback {
        println!("  {text}");
    }
    for correction in &feedback.corrections {
        println!("  Correction: {correction}");
    }
    for example in &feedback.example_sentences {
        println!("  Example: {example}");
    }
}

fn print_summary(controller: &Controller) {
    let names = |words: &[client::WordContext]| {
        words
            .iter()
            .map(|word| word.word.clone())
            .collect::<Vec<_>>()
            .join(", ")
    };

    println!();
    if let Some(summary) = controller.summary() {
        // The closing message already went out through the transcript, so only
        // the statistics remain to print here.
        println!(
            "You practiced {} words and skipped {}.",
            summary.words_practiced, summary.words_skipped
        );
        if !summary.word_results.is_empty() {
            println!("{}", Table::new(&summary.word_results).with(Style::rounded()));
        }
    }

    if !controller.practiced_words().is_empty() {
        println!("Practiced: {}", names(controller.practiced_words()));
    }
    if !controller.skipped_words().is_empty() {
        println!("Skipped: {}", names(controller.skipped_words()));
    }
}
