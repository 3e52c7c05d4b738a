// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use crate::client;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Sender {
    Tutor,
    Learner,
}

/// One chat turn. The transcript is append-only: a message never changes
/// after it is recorded.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Message {
    pub(crate) sender: Sender,
    pub(crate) text: String,
    pub(crate) feedback: Option<client::Feedback>,
    /// Position within the session transcript.
    pub(crate) ordinal: usize,
}
