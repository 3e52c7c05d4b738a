// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use log::{debug, error, warn};

use crate::{
    client,
    error::{Error, Result},
};

use super::transcript::{Message, Sender};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    Initializing,
    Practicing,
    Completed,
}

/// Drives one practice session against the backend.
///
/// The controller owns the transcript and the per-word bookkeeping, but it
/// never computes progress itself: the practiced/skipped/total counters are
/// taken verbatim from server responses, so a failed call leaves them
/// untouched.
pub(crate) struct Controller {
    phase: Phase,
    session_id: Option<i64>,
    current_word: Option<client::WordContext>,
    transcript: Vec<Message>,
    progress: client::Progress,
    /// Whether the word currently shown has received structured feedback.
    /// Decides which tray the word lands in when the session advances.
    feedback_received: bool,
    practiced: Vec<client::WordContext>,
    skipped: Vec<client::WordContext>,
    summary: Option<client::Summary>,
    start_error: Option<String>,
}

impl Controller {
    pub(crate) const fn new() -> Self {
        Self {
            phase: Phase::Initializing,
            session_id: None,
            current_word: None,
            transcript: Vec::new(),
            progress: client::Progress {
                practiced: 0,
                skipped: 0,
                total: 0,
            },
            feedback_received: false,
            practiced: Vec::new(),
            skipped: Vec::new(),
            summary: None,
            start_error: None,
        }
    }

    pub(crate) const fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub(crate) const fn current_word(&self) -> Option<&client::WordContext> {
        self.current_word.as_ref()
    }

    pub(crate) const fn progress(&self) -> client::Progress {
        self.progress
    }

    pub(crate) fn practiced_words(&self) -> &[client::WordContext] {
        &self.practiced
    }

    pub(crate) fn skipped_words(&self) -> &[client::WordContext] {
        &self.skipped
    }

    pub(crate) const fn summary(&self) -> Option<&client::Summary> {
        self.summary.as_ref()
    }

    pub(crate) fn start_error(&self) -> Option<&str> {
        self.start_error.as_deref()
    }

    /// Starts a new session. On success the controller enters the practicing
    /// phase with the tutor's greeting as the first transcript entry; on
    /// failure it stays in the initializing phase and records the error for
    /// display.
    pub(crate) async fn start<C: client::Client + Sync>(
        &mut self,
        client: &C,
        words_count: Option<u32>,
    ) -> Result<()> {
        if self.phase != Phase::Initializing {
            error!("cannot start a session that is already underway");
            return Err(Error::Command);
        }

        match client.start_session(words_count).await {
            Ok(started) => {
                debug!("session {} started", started.session_id);

                self.session_id = Some(started.session_id);
                self.current_word = started.current_word;
                self.progress = started.progress;
                self.push(Sender::Tutor, started.greeting, None);
                self.phase = Phase::Practicing;
                self.start_error = None;
                Ok(())
            }
            Err(err) => {
                self.start_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Submits a practice sentence for the current word.
    ///
    /// The learner's message is appended optimistically before the call. On
    /// success the tutor's reply (with any structured feedback) follows it and
    /// the server's counters are absorbed. On failure the optimistic entry is
    /// rolled back and replaced by a single tutor-styled error message, so the
    /// transcript grows by exactly one entry and the session state is
    /// otherwise unchanged.
    pub(crate) async fn submit<C: client::Client + Sync>(
        &mut self,
        client: &C,
        sentence: &str,
    ) -> Result<()> {
        let session_id = self.practicing_session()?;

        self.push(Sender::Learner, sentence.to_owned(), None);

        match client.send_sentence(session_id, sentence).await {
            Ok(exchange) => {
                if exchange.feedback.is_some() {
                    self.feedback_received = true;
                }

                self.push(Sender::Tutor, exchange.reply.clone(), exchange.feedback.clone());
                self.complete_exchange(client, session_id, exchange).await;
                Ok(())
            }
            Err(err) => {
                let _ = self.transcript.pop();
                self.push(
                    Sender::Tutor,
                    format!("I could not check that sentence ({err}). Please try again."),
                    None,
                );
                Ok(())
            }
        }
    }

    /// Moves the session to the next word, or completes it if the current
    /// word was the last one.
    ///
    /// On success the finished word is filed into the practiced or skipped
    /// tray depending on whether it received feedback. On failure the current
    /// word stays in place and the error surfaces as a tutor-styled message.
    pub(crate) async fn advance<C: client::Client + Sync>(&mut self, client: &C) -> Result<()> {
        let session_id = self.practicing_session()?;

        match client.next_word(session_id).await {
            Ok(exchange) => {
                if let Some(finished) = self.current_word.take() {
                    if self.feedback_received {
                        self.practiced.push(finished);
                    } else {
                        self.skipped.push(finished);
                    }
                }
                self.feedback_received = false;

                self.push(Sender::Tutor, exchange.reply.clone(), None);
                self.complete_exchange(client, session_id, exchange).await;
                Ok(())
            }
            Err(err) => {
                self.push(
                    Sender::Tutor,
                    format!("I could not move to the next word ({err}). Please try again."),
                    None,
                );
                Ok(())
            }
        }
    }

    /// Discards all session state and returns to the initializing phase.
    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }

    fn practicing_session(&self) -> Result<i64> {
        match (self.phase, self.session_id) {
            (Phase::Practicing, Some(id)) => Ok(id),
            _ => {
                error!("no practice session is underway");
                Err(Error::Command)
            }
        }
    }

    /// Absorbs a successful exchange, fetching the summary separately when
    /// the server reports completion without including one inline.
    async fn complete_exchange<C: client::Client + Sync>(
        &mut self,
        client: &C,
        session_id: i64,
        mut exchange: client::Exchange,
    ) {
        if exchange.session_complete && exchange.summary.is_none() {
            match client.summary(session_id).await {
                Ok(summary) => exchange.summary = Some(summary),
                Err(err) => warn!("We couldn't fetch the session summary: {}", err),
            }
        }

        self.absorb(exchange);
    }

    fn absorb(&mut self, exchange: client::Exchange) {
        self.progress = exchange.progress;

        if exchange.session_complete {
            self.summary = exchange.summary;
            self.current_word = None;
            self.phase = Phase::Completed;
        } else if let Some(word) = exchange.current_word {
            self.current_word = Some(word);
        }
    }

    fn push(&mut self, sender: Sender, text: String, feedback: Option<client::Feedback>) {
        let ordinal = self.transcript.len();
        self.transcript.push(Message {
            sender,
            text,
            feedback,
            ordinal,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, sync::Mutex};

    use async_trait::async_trait;
    use secrecy::SecretString;

    use crate::error;

    use super::*;

    /// A backend that replays canned responses for the session endpoints.
    #[derive(Default)]
    struct ScriptedClient {
        starts: Mutex<VecDeque<Result<client::SessionStart>>>,
        exchanges: Mutex<VecDeque<Result<client::Exchange>>>,
        summaries: Mutex<VecDeque<Result<client::Summary>>>,
    }

    impl ScriptedClient {
        fn with_start(start: Result<client::SessionStart>) -> Self {
            let scripted = Self::default();
            scripted.starts.lock().unwrap().push_back(start);
            scripted
        }

        fn expect(self, exchange: Result<client::Exchange>) -> Self {
            self.exchanges.lock().unwrap().push_back(exchange);
            self
        }

        fn with_summary(self, summary: Result<client::Summary>) -> Self {
            self.summaries.lock().unwrap().push_back(summary);
            self
        }
    }

    #[async_trait]
    impl client::Client for ScriptedClient {
        async fn login(&self, _: &str, _: &SecretString) -> Result<client::User> {
            unimplemented!()
        }

        async fn logout(&self) -> Result<()> {
            unimplemented!()
        }

        async fn me(&self) -> Result<client::User> {
            unimplemented!()
        }

        async fn words(&self) -> Result<Vec<client::Word>> {
            unimplemented!()
        }

        async fn add_words(&self, _: &[client::NewWord]) -> Result<Vec<client::Word>> {
            unimplemented!()
        }

        async fn update_word(&self, _: i64, _: &client::WordPatch) -> Result<client::Word> {
            unimplemented!()
        }

        async fn delete_word(&self, _: i64) -> Result<()> {
            unimplemented!()
        }

        async fn clear_words(&self) -> Result<()> {
            unimplemented!()
        }

        async fn settings(&self) -> Result<client::Settings> {
            unimplemented!()
        }

        async fn update_settings(&self, _: &client::SettingsPatch) -> Result<client::Settings> {
            unimplemented!()
        }

        async fn validate_key(&self, _: client::Provider, _: &SecretString) -> Result<()> {
            unimplemented!()
        }

        async fn start_session(&self, _: Option<u32>) -> Result<client::SessionStart> {
            self.starts
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected start_session call")
        }

        async fn send_sentence(&self, _: i64, _: &str) -> Result<client::Exchange> {
            self.exchanges
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected send_sentence call")
        }

        async fn next_word(&self, _: i64) -> Result<client::Exchange> {
            self.exchanges
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected next_word call")
        }

        async fn summary(&self, _: i64) -> Result<client::Summary> {
            self.summaries
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected summary call")
        }
    }

    fn word(id: i64, word: &str) -> client::WordContext {
        client::WordContext {
            word_id: id,
            word: word.to_owned(),
            pinyin: String::new(),
            meaning: String::new(),
        }
    }

    fn progress(practiced: u32, skipped: u32, total: u32) -> client::Progress {
        client::Progress {
            practiced,
            skipped,
            total,
        }
    }

    fn started() -> client::SessionStart {
        client::SessionStart {
            session_id: 7,
            current_word: Some(word(1, "学习")),
            greeting: "你好! Let's practice.".to_owned(),
            progress: progress(0, 0, 2),
            session_complete: false,
        }
    }

    fn feedback(is_correct: bool) -> client::Feedback {
        client::Feedback {
            grammar_score: 8.0,
            usage_score: 7.0,
            naturalness_score: 9.0,
            is_correct,
            feedback: Some("Nice sentence.".to_owned()),
            corrections: Vec::new(),
            example_sentences: Vec::new(),
        }
    }

    fn reply(exchange_word: Option<client::WordContext>) -> client::Exchange {
        client::Exchange {
            reply: "很好!".to_owned(),
            feedback: Some(feedback(true)),
            current_word: exchange_word,
            progress: progress(0, 0, 2),
            session_complete: false,
            summary: None,
        }
    }

    fn session_summary() -> client::Summary {
        client::Summary {
            session_id: 7,
            summary_text: Some("Great session!".to_owned()),
            words_practiced: 2,
            words_skipped: 0,
            word_results: Vec::new(),
        }
    }

    fn server_error() -> error::Error {
        error::Api::Server {
            status: 502,
            message: "upstream timeout".to_owned(),
        }
        .into()
    }

    async fn practicing(client: &ScriptedClient) -> Controller {
        let mut controller = Controller::new();
        controller.start(client, None).await.expect("start failed");
        controller
    }

    #[tokio::test]
    async fn start_enters_practicing_with_greeting() {
        let client = ScriptedClient::with_start(Ok(started()));
        let controller = practicing(&client).await;

        assert_eq!(controller.phase(), Phase::Practicing);
        assert_eq!(controller.transcript().len(), 1);
        assert_eq!(controller.transcript()[0].sender, Sender::Tutor);
        assert_eq!(controller.transcript()[0].text, "你好! Let's practice.");
        assert_eq!(controller.current_word().map(|w| w.word.as_str()), Some("学习"));
        assert_eq!(controller.progress(), progress(0, 0, 2));
    }

    #[tokio::test]
    async fn start_failure_stays_in_initializing() {
        let client = ScriptedClient::with_start(Err(server_error()));
        let mut controller = Controller::new();

        controller
            .start(&client, None)
            .await
            .expect_err("start must fail");

        assert_eq!(controller.phase(), Phase::Initializing);
        assert!(controller.transcript().is_empty());
        assert!(controller
            .start_error()
            .is_some_and(|e| e.contains("upstream timeout")));
    }

    #[tokio::test]
    async fn submit_appends_both_sides_and_absorbs_counters() {
        let client = ScriptedClient::with_start(Ok(started())).expect(Ok(client::Exchange {
            progress: progress(1, 0, 2),
            ..reply(Some(word(1, "学习")))
        }));
        let mut controller = practicing(&client).await;

        controller
            .submit(&client, "我喜欢学习中文")
            .await
            .expect("submit failed");

        let transcript = controller.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[1].sender, Sender::Learner);
        assert_eq!(transcript[1].text, "我喜欢学习中文");
        assert_eq!(transcript[2].sender, Sender::Tutor);
        assert!(transcript[2].feedback.is_some());
        assert_eq!(transcript[2].ordinal, 2);

        assert_eq!(controller.progress(), progress(1, 0, 2));
        assert_eq!(controller.phase(), Phase::Practicing);
    }

    #[tokio::test]
    async fn submit_failure_leaves_one_error_entry_and_counters_untouched() {
        let client = ScriptedClient::with_start(Ok(started())).expect(Err(server_error()));
        let mut controller = practicing(&client).await;

        controller
            .submit(&client, "我喜欢学习中文")
            .await
            .expect("a failed exchange is not a controller error");

        let transcript = controller.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].sender, Sender::Tutor);
        assert!(transcript[1].text.contains("upstream timeout"));
        assert!(transcript[1].feedback.is_none());

        assert_eq!(controller.progress(), progress(0, 0, 2));
        assert_eq!(controller.current_word().map(|w| w.word.as_str()), Some("学习"));
        assert_eq!(controller.phase(), Phase::Practicing);
    }

    #[tokio::test]
    async fn advance_replaces_word_and_files_it_by_feedback() {
        let client = ScriptedClient::with_start(Ok(started()))
            .expect(Ok(client::Exchange {
                progress: progress(1, 0, 2),
                ..reply(Some(word(1, "学习")))
            }))
            .expect(Ok(client::Exchange {
                reply: "Next word!".to_owned(),
                feedback: None,
                current_word: Some(word(2, "朋友")),
                progress: progress(1, 0, 2),
                session_complete: false,
                summary: None,
            }));
        let mut controller = practicing(&client).await;

        controller
            .submit(&client, "我喜欢学习中文")
            .await
            .expect("submit failed");
        controller.advance(&client).await.expect("advance failed");

        assert_eq!(controller.current_word().map(|w| w.word.as_str()), Some("朋友"));
        assert_eq!(controller.practiced_words().len(), 1);
        assert_eq!(controller.practiced_words()[0].word, "学习");
        assert!(controller.skipped_words().is_empty());
        assert_eq!(controller.phase(), Phase::Practicing);
    }

    #[tokio::test]
    async fn advance_without_feedback_files_word_as_skipped() {
        let client = ScriptedClient::with_start(Ok(started())).expect(Ok(client::Exchange {
            reply: "Next word!".to_owned(),
            feedback: None,
            current_word: Some(word(2, "朋友")),
            progress: progress(0, 1, 2),
            session_complete: false,
            summary: None,
        }));
        let mut controller = practicing(&client).await;

        controller.advance(&client).await.expect("advance failed");

        assert!(controller.practiced_words().is_empty());
        assert_eq!(controller.skipped_words().len(), 1);
        assert_eq!(controller.skipped_words()[0].word, "学习");
        assert_eq!(controller.progress(), progress(0, 1, 2));
    }

    #[tokio::test]
    async fn advance_failure_keeps_current_word() {
        let client = ScriptedClient::with_start(Ok(started())).expect(Err(server_error()));
        let mut controller = practicing(&client).await;

        controller
            .advance(&client)
            .await
            .expect("a failed exchange is not a controller error");

        assert_eq!(controller.current_word().map(|w| w.word.as_str()), Some("学习"));
        assert!(controller.practiced_words().is_empty());
        assert!(controller.skipped_words().is_empty());
        assert_eq!(controller.transcript().len(), 2);
        assert_eq!(controller.phase(), Phase::Practicing);
    }

    #[tokio::test]
    async fn advance_past_last_word_completes_with_summary() {
        let client = ScriptedClient::with_start(Ok(started())).expect(Ok(client::Exchange {
            reply: "Great session!".to_owned(),
            feedback: None,
            current_word: None,
            progress: progress(2, 0, 2),
            session_complete: true,
            summary: Some(session_summary()),
        }));
        let mut controller = practicing(&client).await;

        controller.advance(&client).await.expect("advance failed");

        assert_eq!(controller.phase(), Phase::Completed);
        assert!(controller.current_word().is_none());
        assert_eq!(controller.summary(), Some(&session_summary()));
        assert_eq!(controller.progress(), progress(2, 0, 2));
    }

    #[tokio::test]
    async fn completion_without_inline_summary_fetches_it() {
        let client = ScriptedClient::with_start(Ok(started()))
            .expect(Ok(client::Exchange {
                reply: "Done.".to_owned(),
                feedback: None,
                current_word: None,
                progress: progress(2, 0, 2),
                session_complete: true,
                summary: None,
            }))
            .with_summary(Ok(session_summary()));
        let mut controller = practicing(&client).await;

        controller.advance(&client).await.expect("advance failed");

        assert_eq!(controller.phase(), Phase::Completed);
        assert_eq!(controller.summary(), Some(&session_summary()));
    }

    #[tokio::test]
    async fn completed_session_rejects_submissions_until_reset() {
        let client = ScriptedClient::with_start(Ok(started())).expect(Ok(client::Exchange {
            reply: "Done.".to_owned(),
            feedback: None,
            current_word: None,
            progress: progress(0, 2, 2),
            session_complete: true,
            summary: Some(session_summary()),
        }));
        let mut controller = practicing(&client).await;
        controller.advance(&client).await.expect("advance failed");

        assert_eq!(controller.phase(), Phase::Completed);
        assert!(matches!(
            controller.submit(&client, "…").await,
            Err(Error::Command)
        ));

        controller.reset();

        assert_eq!(controller.phase(), Phase::Initializing);
        assert!(controller.transcript().is_empty());
        assert!(controller.summary().is_none());
        assert_eq!(controller.progress(), progress(0, 0, 0));
    }
}
