// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use secrecy::SecretString;
use serde::Deserialize;

use crate::client;

/// A response body consumed only for its status; the backend still sends an
/// informational `message` field.
#[derive(Deserialize)]
pub(super) struct Ack {
    #[serde(default)]
    #[allow(dead_code)]
    pub(super) message: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct Token {
    pub(super) access_token: SecretString,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(super) struct User {
    pub(super) id: i64,
    pub(super) username: Option<String>,
    pub(super) preferred_name: Option<String>,
}

impl From<User> for client::User {
    fn from(value: User) -> Self {
        Self {
            id: value.id,
            username: value.username,
            preferred_name: value.preferred_name,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(super) struct Word {
    pub(super) id: i64,
    pub(super) word: String,
    pub(super) pinyin: String,
    pub(super) meaning: String,
    pub(super) confidence_score: f64,
    pub(super) status: String,
    pub(super) source_name: Option<String>,
}

impl From<Word> for client::Word {
    fn from(value: Word) -> Self {
        Self {
            id: value.id,
            word: value.word,
            pinyin: value.pinyin,
            meaning: value.meaning,
            confidence_score: value.confidence_score,
            status: value.status,
            source_name: value.source_name,
        }
    }
}

#[derive(Deserialize)]
pub(super) struct CreatedWords {
    pub(super) created_data: Vec<Word>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(super) struct Settings {
    pub(super) preferred_name: Option<String>,
    pub(super) words_per_session: Option<u32>,
    #[serde(default)]
    pub(super) has_deepseek_key: bool,
    #[serde(default)]
    pub(super) has_gemini_key: bool,
}

impl From<Settings> for client::Settings {
    fn from(value: Settings) -> Self {
        Self {
            preferred_name: value.preferred_name,
            words_per_session: value.words_per_session,
            has_deepseek_key: value.has_deepseek_key,
            has_gemini_key: value.has_gemini_key,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(super) struct WordContext {
    pub(super) word_id: i64,
    pub(super) word: String,
    pub(super) pinyin: String,
    pub(super) meaning: String,
}

impl From<WordContext> for client::WordContext {
    fn from(value: WordContext) -> Self {
        Self {
            word_id: value.word_id,
            word: value.word,
            pinyin: value.pinyin,
            meaning: value.meaning,
        }
    }
}

/// The evaluation agent emits camelCase keys; the three scores are always in
/// the 1 to 10 range by the time the backend has validated them.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(super) struct Feedback {
    pub(super) grammar_score: f64,
    pub(super) usage_score: f64,
    pub(super) naturalness_score: f64,
    #[serde(default)]
    pub(super) is_correct: bool,
    #[serde(default)]
    pub(super) feedback: Option<String>,
    #[serde(default)]
    pub(super) corrections: Vec<String>,
    #[serde(default)]
    pub(super) example_sentences: Vec<String>,
}

impl From<Feedback> for client::Feedback {
    fn from(value: Feedback) -> Self {
        Self {
            grammar_score: value.grammar_score,
            usage_score: value.usage_score,
            naturalness_score: value.naturalness_score,
            is_correct: value.is_correct,
            feedback: value.feedback,
            corrections: value.corrections,
            example_sentences: value.example_sentences,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(super) struct SessionRef {
    pub(super) id: i64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(super) struct SessionStart {
    pub(super) session: SessionRef,
    pub(super) current_word: Option<WordContext>,
    pub(super) greeting_message: String,
    #[serde(default)]
    pub(super) words_practiced: u32,
    #[serde(default)]
    pub(super) words_skipped: u32,
    #[serde(default)]
    pub(super) words_total: u32,
    #[serde(default)]
    pub(super) session_complete: bool,
}

impl From<SessionStart> for client::SessionStart {
    fn from(value: SessionStart) -> Self {
        Self {
            session_id: value.session.id,
            current_word: value.current_word.map(Into::into),
            greeting: value.greeting_message,
            progress: client::Progress {
                practiced: value.words_practiced,
                skipped: value.words_skipped,
                total: value.words_total,
            },
            session_complete: value.session_complete,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(super) struct Exchange {
    pub(super) laoshi_response: String,
    #[serde(default)]
    pub(super) feedback: Option<Feedback>,
    #[serde(default)]
    pub(super) current_word: Option<WordContext>,
    pub(super) words_practiced: u32,
    pub(super) words_skipped: u32,
    pub(super) words_total: u32,
    pub(super) session_complete: bool,
    #[serde(default)]
    pub(super) summary: Option<Summary>,
}

impl From<Exchange> for client::Exchange {
    fn from(value: Exchange) -> Self {
        Self {
            reply: value.laoshi_response,
            feedback: value.feedback.map(Into::into),
            current_word: value.current_word.map(Into::into),
            progress: client::Progress {
                practiced: value.words_practiced,
                skipped: value.words_skipped,
                total: value.words_total,
            },
            session_complete: value.session_complete,
            summary: value.summary.map(Into::into),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(super) struct Summary {
    pub(super) session_id: i64,
    #[serde(default)]
    pub(super) summary_text: Option<String>,
    pub(super) words_practiced: u32,
    pub(super) words_skipped: u32,
    #[serde(default)]
    pub(super) word_results: Vec<WordResult>,
}

impl From<Summary> for client::Summary {
    fn from(value: Summary) -> Self {
        Self {
            session_id: value.session_id,
            summary_text: value.summary_text,
            words_practiced: value.words_practiced,
            words_skipped: value.words_skipped,
            word_results: value.word_results.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(super) struct WordResult {
    pub(super) word: String,
    pub(super) grammar_score: Option<f64>,
    pub(super) usage_score: Option<f64>,
    pub(super) naturalness_score: Option<f64>,
    #[serde(default)]
    pub(super) is_correct: bool,
    #[serde(default)]
    pub(super) is_skipped: bool,
}

impl From<WordResult> for client::WordResult {
    fn from(value: WordResult) -> Self {
        Self {
            word: value.word,
            grammar_score: value.grammar_score,
            usage_score: value.usage_score,
            naturalness_score: value.naturalness_score,
            is_correct: value.is_correct,
            is_skipped: value.is_skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_test::{assert_de_tokens, Token as SerdeToken};

    #[test]
    fn feedback_camel_case_keys() {
        assert_de_tokens(
            &Feedback {
                grammar_score: 9.0,
                usage_score: 8.0,
                naturalness_score: 7.5,
                is_correct: true,
                feedback: Some("很好".to_owned()),
                corrections: vec![],
                example_sentences: vec!["我喜欢学习中文。".to_owned()],
            },
            &[
                SerdeToken::Map { len: None },
                SerdeToken::Str("grammarScore"),
                SerdeToken::F64(9.0),
                SerdeToken::Str("usageScore"),
                SerdeToken::F64(8.0),
                SerdeToken::Str("naturalnessScore"),
                SerdeToken::F64(7.5),
                SerdeToken::Str("isCorrect"),
                SerdeToken::Bool(true),
                SerdeToken::Str("feedback"),
                SerdeToken::Some,
                SerdeToken::Str("很好"),
                SerdeToken::Str("exampleSentences"),
                SerdeToken::Seq { len: Some(1) },
                SerdeToken::Str("我喜欢学习中文。"),
                SerdeToken::SeqEnd,
                SerdeToken::MapEnd,
            ],
        );
    }

    #[test]
    fn exchange_with_summary() {
        let exchange: Exchange = serde_json::from_value(serde_json::json!({
            "laoshi_response": "Session complete. Keep practicing!",
            "feedback": null,
            "current_word": null,
            "words_practiced": 4,
            "words_skipped": 1,
            "words_total": 5,
            "session_complete": true,
            "summary": {
                "session_id": 7,
                "summary_text": "Session complete. Keep practicing!",
                "words_practiced": 4,
                "words_skipped": 1,
                "word_results": [
                    {
                        "word": "学习",
                        "grammar_score": 10.0,
                        "usage_score": 9.0,
                        "naturalness_score": 8.0,
                        "is_correct": true,
                        "is_skipped": false
                    },
                    {
                        "word": "朋友",
                        "grammar_score": null,
                        "usage_score": null,
                        "naturalness_score": null,
                        "is_correct": false,
                        "is_skipped": true
                    }
                ]
            }
        }))
        .unwrap();

        assert!(exchange.session_complete);
        assert!(exchange.current_word.is_none());

        let summary = exchange.summary.expect("summary must be present");
        assert_eq!(summary.session_id, 7);
        assert_eq!(summary.word_results.len(), 2);
        assert!(summary.word_results[1].is_skipped);
    }

    #[test]
    fn session_start_scenario() {
        let start: SessionStart = serde_json::from_value(serde_json::json!({
            "session": {"id": 7},
            "current_word": {
                "word_id": 42,
                "word": "学习",
                "pinyin": "xué xí",
                "meaning": "to study, to learn"
            },
            "greeting_message": "你好! Let's practice.",
            "words_practiced": 0,
            "words_skipped": 0,
            "words_total": 5,
            "session_complete": false
        }))
        .unwrap();

        let start: crate::client::SessionStart = start.into();
        assert_eq!(start.session_id, 7);
        assert_eq!(
            start.current_word.as_ref().map(|w| w.word.as_str()),
            Some("学习")
        );
        assert_eq!(start.progress.total, 5);
        assert!(!start.session_complete);
    }
}
