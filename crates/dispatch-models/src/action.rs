//! Action messages produced by workflow state changes.
//!
//! When an artifact moves through a workflow transition, the transition may
//! trigger follow-up actions. Each action becomes one `ActionMessage` that is
//! queued for a worker to carry out.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{MessageId, TenantId};
use crate::priority::Priority;

/// Kind of follow-up action triggered by a workflow transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Send an email notification to the configured recipients.
    Notification,
    /// Create child artifacts of the configured types.
    GenerateDescendants,
    /// Generate test cases from a process diagram.
    GenerateTests,
    /// Generate user stories from a process diagram.
    GenerateUserStories,
}

impl ActionKind {
    /// All action kinds.
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Notification,
        ActionKind::GenerateDescendants,
        ActionKind::GenerateTests,
        ActionKind::GenerateUserStories,
    ];

    /// Returns the snake_case name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Notification => "notification",
            ActionKind::GenerateDescendants => "generate_descendants",
            ActionKind::GenerateTests => "generate_tests",
            ActionKind::GenerateUserStories => "generate_user_stories",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the priority an action kind is queued at unless overridden.
///
/// Notifications are user-facing and cheap, so they go first. Generation
/// jobs are bulk work and can wait.
pub fn default_priority(kind: ActionKind) -> Priority {
    match kind {
        ActionKind::Notification => Priority::High,
        ActionKind::GenerateDescendants => Priority::Normal,
        ActionKind::GenerateTests => Priority::Low,
        ActionKind::GenerateUserStories => Priority::Low,
    }
}

/// A queued follow-up action for one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionMessage {
    /// Unique identifier for the message.
    pub id: MessageId,

    /// Tenant whose workflow produced the action.
    pub tenant_id: TenantId,

    /// What the worker should do.
    pub kind: ActionKind,

    /// Priority the message is queued at.
    #[serde(default)]
    pub priority: Priority,

    /// Artifacts the action applies to.
    #[serde(default)]
    pub artifact_ids: Vec<i32>,

    /// Revision at which the transition happened.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub revision_id: Option<i32>,

    /// User who triggered the transition.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user_id: Option<i32>,

    /// When the message was created.
    pub created_at: DateTime<Utc>,

    /// Free-form action parameters.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ActionMessage {
    /// Creates a new message at the default priority for `kind`.
    pub fn new(tenant_id: impl Into<TenantId>, kind: ActionKind) -> Self {
        Self {
            id: MessageId::new(),
            tenant_id: tenant_id.into(),
            kind,
            priority: default_priority(kind),
            artifact_ids: Vec::new(),
            revision_id: None,
            user_id: None,
            created_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Overrides the priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the artifacts the action applies to.
    pub fn with_artifacts(mut self, artifact_ids: impl IntoIterator<Item = i32>) -> Self {
        self.artifact_ids = artifact_ids.into_iter().collect();
        self
    }

    /// Sets the revision.
    pub fn with_revision(mut self, revision_id: i32) -> Self {
        self.revision_id = Some(revision_id);
        self
    }

    /// Sets the triggering user.
    pub fn with_user(mut self, user_id: i32) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Adds a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
