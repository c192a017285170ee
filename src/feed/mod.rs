// SPDX-License-Identifier: GPL-3.0-only
pub mod catalog;
pub mod error;
pub mod traits;
pub mod websocket;

pub use catalog::ArchiveCatalog;
pub use error::FeedError;
pub use traits::{ConnectionCallback, EventSource, LoggingCallback};
pub use websocket::WebSocketEventSource;
