// SPDX-License-Identifier: GPL-3.0-only
pub mod models;
pub mod synchronizer;

pub use models::{StreamEvent, StreamEventKind, StreamItem};
pub use synchronizer::{LiveListSynchronizer, SyncHandle};
