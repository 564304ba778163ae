//! Events that can occur in a session

use super::reply::labels;
use crate::candidate::Candidate;
use crate::criteria::Gender;
use crate::error::CollaboratorError;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // User events
    UserMessage {
        text: String,
    },

    // Collaborator outcomes
    SearchCompleted {
        candidates: Vec<Candidate>,
    },
    FavoriteAdded,
    FavoritesListed {
        favorites: Vec<Candidate>,
    },
    FavoritesCleared,
    CollaboratorFailed {
        error: CollaboratorError,
    },
}

impl Event {
    pub fn user(text: impl Into<String>) -> Self {
        Event::UserMessage { text: text.into() }
    }
}

/// Criteria field picked from the modify menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    City,
    Age,
    Gender,
}

/// Input class of a user message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Greet,
    StartSearch,
    Finish,
    ConfirmCity,
    ModifyCity,
    ChooseGender(Gender),
    ConfirmData,
    ModifyData,
    EditField(Field),
    Next,
    AddFavorite,
    ShowFavorites,
    ClearFavorites,
    /// Anything that is not a button label
    Text(String),
}

impl Command {
    pub fn parse(text: &str) -> Self {
        match text.trim() {
            labels::GREET => Command::Greet,
            labels::START => Command::StartSearch,
            labels::FINISH => Command::Finish,
            labels::RIGHT_CITY => Command::ConfirmCity,
            labels::MODIFY_CITY => Command::ModifyCity,
            labels::BOY => Command::ChooseGender(Gender::Male),
            labels::GIRL => Command::ChooseGender(Gender::Female),
            labels::ALL_TRUE => Command::ConfirmData,
            labels::CHANGE_PARAMETERS => Command::ModifyData,
            labels::CITY => Command::EditField(Field::City),
            labels::AGE => Command::EditField(Field::Age),
            labels::GENDER => Command::EditField(Field::Gender),
            labels::NEXT => Command::Next,
            labels::ADD_FAVORITE => Command::AddFavorite,
            labels::FAVORITES => Command::ShowFavorites,
            labels::CLEAR_FAVORITES => Command::ClearFavorites,
            _ => Command::Text(text.to_string()),
        }
    }
}
