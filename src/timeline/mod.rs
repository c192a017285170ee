// SPDX-License-Identifier: GPL-3.0-only
pub mod action;
pub mod dispatcher;

pub use action::{Action, ActionType, ElementRef};
pub use dispatcher::{ActionDispatcher, ActionListener, ListenerId};
