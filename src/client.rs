// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::ValueEnum;
use inflector::Inflector as _;
use secrecy::SecretString;
use tabled::Tabled;

use crate::error::Result;

/// A BYOK evaluation-model provider supported by the backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum Provider {
    Deepseek,
    Gemini,
}

impl Provider {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Deepseek => "deepseek",
            Self::Gemini => "gemini",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_title_case())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct User {
    pub(crate) id: i64,
    pub(crate) username: Option<String>,
    pub(crate) preferred_name: Option<String>,
}

impl User {
    /// The name the tutor should greet the user by.
    pub(crate) fn display_name(&self) -> &str {
        self.preferred_name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or("learner")
    }
}

#[derive(Clone, Debug, PartialEq, Tabled)]
pub(crate) struct Word {
    #[tabled(rename = "ID")]
    pub(crate) id: i64,
    #[tabled(rename = "Word")]
    pub(crate) word: String,
    #[tabled(rename = "Pinyin")]
    pub(crate) pinyin: String,
    #[tabled(rename = "Meaning")]
    pub(crate) meaning: String,
    #[tabled(rename = "Confidence")]
    pub(crate) confidence_score: f64,
    #[tabled(rename = "Status")]
    pub(crate) status: String,
    #[tabled(rename = "Source", display_with = "Self::format_source")]
    pub(crate) source_name: Option<String>,
}

impl Word {
    fn format_source(source: &Option<String>) -> String {
        source.clone().unwrap_or_default()
    }
}

/// A vocabulary entry to be created. The backend creates words in bulk, so
/// these are always submitted as a list.
#[derive(Clone, Debug)]
pub(crate) struct NewWord {
    pub(crate) word: String,
    pub(crate) pinyin: String,
    pub(crate) meaning: String,
    pub(crate) source_name: Option<String>,
}

/// A partial update to an existing vocabulary entry. Fields left as `None`
/// are not sent.
#[derive(Clone, Debug, Default)]
pub(crate) struct WordPatch {
    pub(crate) word: Option<String>,
    pub(crate) pinyin: Option<String>,
    pub(crate) meaning: Option<String>,
    pub(crate) source_name: Option<String>,
}

impl WordPatch {
    pub(crate) const fn is_empty(&self) -> bool {
        self.word.is_none()
            && self.pinyin.is_none()
            && self.meaning.is_none()
            && self.source_name.is_none()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Settings {
    pub(crate) preferred_name: Option<String>,
    pub(crate) words_per_session: Option<u32>,
    pub(crate) has_deepseek_key: bool,
    pub(crate) has_gemini_key: bool,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct SettingsPatch {
    pub(crate) preferred_name: Option<String>,
    pub(crate) words_per_session: Option<u32>,
}

impl SettingsPatch {
    pub(crate) const fn is_empty(&self) -> bool {
        self.preferred_name.is_none() && self.words_per_session.is_none()
    }
}

/// The word currently being practiced. Replaced wholesale when the session
/// advances; never partially updated.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct WordContext {
    pub(crate) word_id: i64,
    pub(crate) word: String,
    pub(crate) pinyin: String,
    pub(crate) meaning: String,
}

/// Structured evaluation of one submitted sentence.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Feedback {
    pub(crate) grammar_score: f64,
    pub(crate) usage_score: f64,
    pub(crate) naturalness_score: f64,
    pub(crate) is_correct: bool,
    pub(crate) feedback: Option<String>,
    pub(crate) corrections: Vec<String>,
    pub(crate) example_sentences: Vec<String>,
}

/// Server-authoritative progress counters for a practice session.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Progress {
    pub(crate) practiced: u32,
    pub(crate) skipped: u32,
    pub(crate) total: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SessionStart {
    pub(crate) session_id: i64,
    pub(crate) current_word: Option<WordContext>,
    pub(crate) greeting: String,
    pub(crate) progress: Progress,
    pub(crate) session_complete: bool,
}

/// One submit or advance exchange with the tutor.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Exchange {
    pub(crate) reply: String,
    pub(crate) feedback: Option<Feedback>,
    pub(crate) current_word: Option<WordContext>,
    pub(crate) progress: Progress,
    pub(crate) session_complete: bool,
    pub(crate) summary: Option<Summary>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Summary {
    pub(crate) session_id: i64,
    pub(crate) summary_text: Option<String>,
    pub(crate) words_practiced: u32,
    pub(crate) words_skipped: u32,
    pub(crate) word_results: Vec<WordResult>,
}

#[derive(Clone, Debug, PartialEq, Tabled)]
pub(crate) struct WordResult {
    #[tabled(rename = "Word")]
    pub(crate) word: String,
    #[tabled(rename = "Grammar", display_with = "Self::format_score")]
    pub(crate) grammar_score: Option<f64>,
    #[tabled(rename = "Usage", display_with = "Self::format_score")]
    pub(crate) usage_score: Option<f64>,
    #[tabled(rename = "Naturalness", display_with = "Self::format_score")]
    pub(crate) naturalness_score: Option<f64>,
    #[tabled(rename = "Correct", display_with = "Self::format_flag")]
    pub(crate) is_correct: bool,
    #[tabled(rename = "Skipped", display_with = "Self::format_flag")]
    pub(crate) is_skipped: bool,
}

impl WordResult {
    fn format_score(score: &Option<f64>) -> String {
        match score {
            Some(s) => format!("{s:.1}"),
            None => "-".to_owned(),
        }
    }

    fn format_flag(flag: &bool) -> String {
        if *flag { "yes" } else { "no" }.to_owned()
    }
}

/// The full backend surface the commands consume. The production
/// implementation lives in the `laoshi` module; tests substitute scripted
/// implementations.
#[async_trait]
pub(crate) trait Client {
    async fn login(&self, username: &str, password: &SecretString) -> Result<User>;
    async fn logout(&self) -> Result<()>;
    async fn me(&self) -> Result<User>;

    async fn words(&self) -> Result<Vec<Word>>;
    async fn add_words(&self, words: &[NewWord]) -> Result<Vec<Word>>;
    async fn update_word(&self, id: i64, patch: &WordPatch) -> Result<Word>;
    async fn delete_word(&self, id: i64) -> Result<()>;
    async fn clear_words(&self) -> Result<()>;

    async fn settings(&self) -> Result<Settings>;
    async fn update_settings(&self, patch: &SettingsPatch) -> Result<Settings>;
    async fn validate_key(&self, provider: Provider, key: &SecretString) -> Result<()>;

    async fn start_session(&self, words_count: Option<u32>) -> Result<SessionStart>;
    async fn send_sentence(&self, session_id: i64, sentence: &str) -> Result<Exchange>;
    async fn next_word(&self, session_id: i64) -> Result<Exchange>;
    async fn summary(&self, session_id: i64) -> Result<Summary>;
}

#[async_trait]
impl<T: Client + Send + Sync + ?Sized> Client for Box<T> {
    async fn login(&self, username: &str, password: &SecretString) -> Result<User> {
        (**self).login(username, password).await
    }

    async fn logout(&self) -> Result<()> {
        (**self).logout().await
    }

    async fn me(&self) -> Result<User> {
        (**self).me().await
    }

    async fn words(&self) -> Result<Vec<Word>> {
        (**self).words().await
    }

    async fn add_words(&self, words: &[NewWord]) -> Result<Vec<Word>> {
        (**self).add_words(words).await
    }

    async fn update_word(&self, id: i64, patch: &WordPatch) -> Result<Word> {
        (**self).update_word(id, patch).await
    }

    async fn delete_word(&self, id: i64) -> Result<()> {
        (**self).delete_word(id).await
    }

    async fn clear_words(&self) -> Result<()> {
        (**self).clear_words().await
    }

    async fn settings(&self) -> Result<Settings> {
        (**self).settings().await
    }

    async fn update_settings(&self, patch: &SettingsPatch) -> Result<Settings> {
        (**self).update_settings(patch).await
    }

    async fn validate_key(&self, provider: Provider, key: &SecretString) -> Result<()> {
        (**self).validate_key(provider, key).await
    }

    async fn start_session(&self, words_count: Option<u32>) -> Result<SessionStart> {
        (**self).start_session(words_count).await
    }

    async fn send_sentence(&self, session_id: i64, sentence: &str) -> Result<Exchange> {
        (**self).send_sentence(session_id, sentence).await
    }

    async fn next_word(&self, session_id: i64) -> Result<Exchange> {
        (**self).next_word(session_id).await
    }

    async fn summary(&self, session_id: i64) -> Result<Summary> {
        (**self).summary(session_id).await
    }
}
