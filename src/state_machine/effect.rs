//! Effects produced by state transitions

use super::reply::{self, OutgoingMessage};
use crate::candidate::Candidate;
use crate::criteria::Criteria;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Deliver a message to the session's user
    Send(OutgoingMessage),

    /// Run a candidate search; the result comes back as `SearchCompleted`
    Search { criteria: Criteria },

    /// Save a candidate to favorites; acknowledged with `FavoriteAdded`
    AddFavorite {
        candidate: Candidate,
        criteria: Criteria,
    },

    /// Load favorites; answered with `FavoritesListed`
    ListFavorites,

    /// Drop all favorite links; acknowledged with `FavoritesCleared`
    ClearFavorites,
}

impl Effect {
    pub fn send(message: OutgoingMessage) -> Self {
        Effect::Send(message)
    }

    /// Card for `candidate` followed by the browsing keyboard
    pub fn show_candidate(candidate: &Candidate) -> [Self; 2] {
        [
            Effect::Send(reply::candidate_card(candidate)),
            Effect::Send(reply::navigation()),
        ]
    }

    #[allow(dead_code)] // Used in tests
    pub fn is_send(&self) -> bool {
        matches!(self, Effect::Send(_))
    }
}
