//! User-visible notifications (toasts).
//!
//! `NOTIFICATION_SHOW` appends a notification with a fresh id and, when the
//! environment carries a time-to-live, schedules the matching
//! `NOTIFICATION_HIDE` as a delayed effect.

use crate::environment::StorefrontEnvironment;
use crate::types::StorefrontAction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_core::{Effect, Reducer, SmallVec, delay, smallvec};

/// Severity of a notification
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Confirmation
    Success,
    /// Neutral information
    #[default]
    Info,
    /// Something needs attention
    Warning,
    /// An operation failed
    Error,
}

/// One visible notification
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Id assigned when shown
    pub id: u64,
    /// Severity
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Localized title
    pub title: String,
    /// Localized body
    pub text: String,
    /// When the notification was shown
    pub shown_at: DateTime<Utc>,
}

/// Notifications slice
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsState {
    /// Visible notifications, oldest first
    pub items: Vec<Notification>,
    next_id: u64,
}

impl NotificationsState {
    /// Id the next shown notification will get
    #[must_use]
    pub const fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Most recently shown notification, if any is visible
    #[must_use]
    pub fn latest(&self) -> Option<&Notification> {
        self.items.last()
    }
}

/// Reducer for the notifications slice
#[derive(Clone, Copy, Debug, Default)]
pub struct NotificationsReducer;

impl Reducer for NotificationsReducer {
    type State = NotificationsState;
    type Action = StorefrontAction;
    type Environment = StorefrontEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            StorefrontAction::NotificationShow { kind, title, text } => {
                let id = state.next_id;
                state.next_id += 1;
                state.items.push(Notification {
                    id,
                    kind,
                    title,
                    text,
                    shown_at: env.clock.now(),
                });
                tracing::debug!(id, ?kind, "Notification shown");

                match env.notification_ttl {
                    Some(ttl) => smallvec![delay! {
                        duration: ttl,
                        action: StorefrontAction::NotificationHide { id }
                    }],
                    None => SmallVec::new(),
                }
            },
            StorefrontAction::NotificationHide { id } => {
                state.items.retain(|notification| notification.id != id);
                SmallVec::new()
            },
            _ => SmallVec::new(),
        }
    }
}
