// SPDX-License-Identifier: GPL-3.0-only
pub mod api;
pub mod config;
pub mod feed;
pub mod logging;
pub mod parameters;
pub mod streams;
pub mod timeline;
pub mod utils;

#[cfg(test)]
pub mod test_helpers;
