// SPDX-License-Identifier: GPL-3.0-only
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Click,
    ContextMenu,
    GrabStart,
    GrabMove,
    GrabEnd,
    MouseEnter,
    MouseMove,
    MouseLeave,
}

impl ActionType {
    /// Whether this action belongs to a grab gesture (pan, select, resize, drag)
    pub fn is_grab(self) -> bool {
        matches!(self, ActionType::GrabStart | ActionType::GrabMove | ActionType::GrabEnd)
    }
}

/// Reference to the UI element an action happened on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementRef(pub String);

/// An action as generated by the timeline event handler.
/// Every action is delivered to all registered listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ElementRef>,

    pub client_x: f64,
    pub client_y: f64,

    /// Whether the user is in the middle of any kind of grab action
    pub grabbing: bool,

    /// Date under the pointer, when the action maps to a viewport location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

impl Action {
    pub fn new(kind: ActionType, client_x: f64, client_y: f64) -> Self {
        Self {
            kind,
            target: None,
            client_x,
            client_y,
            grabbing: false,
            date: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(ElementRef(target.into()));
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn grabbing(mut self, grabbing: bool) -> Self {
        self.grabbing = grabbing;
        self
    }
}
