// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

mod controller;
mod transcript;

pub(crate) use controller::{Controller, Phase};
pub(crate) use transcript::Sender;
