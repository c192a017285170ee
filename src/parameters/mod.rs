// SPDX-License-Identifier: GPL-3.0-only
pub mod detail;
pub mod models;

pub use detail::ParameterDetailView;
pub use models::{Parameter, ParameterValue, Value};
