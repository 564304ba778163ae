//! Session state types

use crate::candidate::Candidate;
use crate::criteria::{City, Criteria, Gender};
use crate::cursor::ResultCursor;

/// What a partially collected funnel step holds.
///
/// On the first pass the step carries only what has been collected so far.
/// When the user came from the modify menu the full criteria are already known,
/// and the step returns to `ConfirmData` once its field is replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Draft<T> {
    FirstPass(T),
    Editing(Criteria),
}

/// Session state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConvState {
    /// No search in progress
    #[default]
    Idle,

    /// Waiting for a city name
    AwaitCity { editing: Option<Criteria> },

    /// City parsed, waiting for the user to confirm it
    ConfirmCity {
        city: City,
        editing: Option<Criteria>,
    },

    /// Waiting for a gender choice
    AwaitGender { draft: Draft<City> },

    /// Waiting for an age
    AwaitAge { draft: Draft<(City, Gender)> },

    /// Criteria complete, waiting for confirmation
    ConfirmData { criteria: Criteria },

    /// Waiting for the field to change
    ModifySelect { criteria: Criteria },

    /// Paging through search results
    Browsing {
        criteria: Criteria,
        cursor: ResultCursor,
    },

    /// Favorites listed; the browsing cursor is kept to resume paging
    Favorites {
        criteria: Criteria,
        cursor: ResultCursor,
    },

    /// User finished; the session is discarded after this
    Terminated,
}

impl ConvState {
    /// Short tag for logs
    pub fn name(&self) -> &'static str {
        match self {
            ConvState::Idle => "idle",
            ConvState::AwaitCity { .. } => "await_city",
            ConvState::ConfirmCity { .. } => "confirm_city",
            ConvState::AwaitGender { .. } => "await_gender",
            ConvState::AwaitAge { .. } => "await_age",
            ConvState::ConfirmData { .. } => "confirm_data",
            ConvState::ModifySelect { .. } => "modify_select",
            ConvState::Browsing { .. } => "browsing",
            ConvState::Favorites { .. } => "favorites",
            ConvState::Terminated => "terminated",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ConvState::Terminated)
    }

    /// Candidate under the cursor while browsing
    pub fn current_candidate(&self) -> Option<&Candidate> {
        match self {
            ConvState::Browsing { cursor, .. } | ConvState::Favorites { cursor, .. } => {
                cursor.current()
            }
            _ => None,
        }
    }
}

/// Per-session configuration, fixed for the session's lifetime
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user_id: i64,
    /// Pre-uploaded attachment sent with the greeting
    pub banner_attachment: Option<String>,
}

impl SessionContext {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            banner_attachment: None,
        }
    }

    pub fn with_banner(mut self, banner: Option<String>) -> Self {
        self.banner_attachment = banner;
        self
    }
}
