// SPDX-License-Identifier: GPL-3.0-only
use tokio::sync::watch;
use tracing::debug;

use crate::parameters::models::{Parameter, ParameterValue, Value};

/// Detail panel state for a single parameter.
///
/// Publishes either the raw or the engineering representation of the
/// current value, depending on the `show_raw` toggle. Nothing is published
/// until a value has been received.
pub struct ParameterDetailView {
    parameter: Option<Parameter>,
    pval: Option<ParameterValue>,
    show_raw: watch::Sender<bool>,
    value: watch::Sender<Option<Value>>,
}

impl ParameterDetailView {
    pub fn new(parameter: Option<Parameter>) -> Self {
        let (show_raw, _) = watch::channel(false);
        let (value, _) = watch::channel(None);
        Self {
            parameter,
            pval: None,
            show_raw,
            value,
        }
    }

    pub fn parameter(&self) -> Option<&Parameter> {
        self.parameter.as_ref()
    }

    pub fn set_parameter(&mut self, parameter: Parameter) {
        self.parameter = Some(parameter);
    }

    pub fn current(&self) -> Option<&ParameterValue> {
        self.pval.as_ref()
    }

    /// Store a new current value and republish it under the current toggle
    pub fn set_value(&mut self, pval: ParameterValue) {
        self.pval = Some(pval);
        self.republish();
    }

    pub fn show_raw_value(&mut self) {
        self.show_raw.send_replace(true);
        self.republish();
    }

    pub fn show_engineering_value(&mut self) {
        self.show_raw.send_replace(false);
        self.republish();
    }

    pub fn is_showing_raw(&self) -> bool {
        *self.show_raw.borrow()
    }

    /// Currently published value
    pub fn value(&self) -> Option<Value> {
        self.value.borrow().clone()
    }

    pub fn subscribe_value(&self) -> watch::Receiver<Option<Value>> {
        self.value.subscribe()
    }

    pub fn subscribe_show_raw(&self) -> watch::Receiver<bool> {
        self.show_raw.subscribe()
    }

    fn republish(&self) {
        let Some(ref pval) = self.pval else {
            return;
        };

        let projected = if self.is_showing_raw() {
            pval.raw_value.clone()
        } else {
            pval.eng_value.clone()
        };

        debug!(
            parameter = self.parameter.as_ref().map(|p| p.qualified_name.as_str()),
            raw = self.is_showing_raw(),
            value = %projected,
            "Publishing parameter value"
        );
        self.value.send_replace(Some(projected));
    }
}

impl Default for ParameterDetailView {
    fn default() -> Self {
        Self::new(None)
    }
}
