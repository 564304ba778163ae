//! Pure state transition function
//!
//! Given the same state, context and event it always yields the same result and
//! performs no I/O. Collaborator work is requested through effects; its outcome
//! comes back as another event.

use super::event::{Command, Field};
use super::reply::{self, OutgoingMessage};
use super::state::{Draft, SessionContext};
use super::{ConvState, Effect, Event};
use crate::candidate::Candidate;
use crate::criteria::{Age, City, Criteria};
use crate::cursor::ResultCursor;

/// Result of a state transition
#[derive(Debug, PartialEq)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    /// Stay in `state`
    pub fn unchanged(state: &ConvState) -> Self {
        Self::new(state.clone())
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    pub fn with_message(self, message: OutgoingMessage) -> Self {
        self.with_effect(Effect::send(message))
    }
}

/// Pure transition function. Total: every (state, event) pair yields a result.
pub fn transition(state: &ConvState, context: &SessionContext, event: Event) -> TransitionResult {
    match event {
        Event::UserMessage { text } => on_command(state, context, Command::parse(&text)),

        // State is left as is so the user can retry the same step
        Event::CollaboratorFailed { .. } => TransitionResult::unchanged(state)
            .with_message(reply::apology())
            .with_message(reprompt(state, context)),

        outcome => on_outcome(state, context, outcome),
    }
}

fn on_command(state: &ConvState, context: &SessionContext, command: Command) -> TransitionResult {
    match (state, command) {
        (state, Command::Finish) if !state.is_terminal() => {
            TransitionResult::new(ConvState::Terminated).with_message(reply::farewell())
        }

        // ============================================================
        // Greeting and start
        // ============================================================
        (ConvState::Idle | ConvState::Terminated, Command::Greet) => {
            TransitionResult::new(ConvState::Idle)
                .with_message(reply::greeting(context.banner_attachment.as_deref()))
        }

        (ConvState::Idle | ConvState::Terminated, Command::StartSearch) => {
            TransitionResult::new(ConvState::AwaitCity { editing: None })
                .with_message(reply::ask_city())
        }

        // ============================================================
        // City
        // ============================================================
        (ConvState::AwaitCity { editing }, Command::Text(text)) => match City::parse(&text) {
            Ok(city) => {
                let prompt = reply::confirm_city(&city);
                TransitionResult::new(ConvState::ConfirmCity {
                    city,
                    editing: editing.clone(),
                })
                .with_message(prompt)
            }
            Err(_) => TransitionResult::unchanged(state).with_message(reply::invalid_city()),
        },

        (ConvState::ConfirmCity { city, editing: None }, Command::ConfirmCity) => {
            TransitionResult::new(ConvState::AwaitGender {
                draft: Draft::FirstPass(city.clone()),
            })
            .with_message(reply::ask_gender())
        }

        (
            ConvState::ConfirmCity {
                city,
                editing: Some(criteria),
            },
            Command::ConfirmCity,
        ) => confirm_data(Criteria {
            city: city.clone(),
            ..criteria.clone()
        }),

        (ConvState::ConfirmCity { editing, .. }, Command::ModifyCity) => {
            TransitionResult::new(ConvState::AwaitCity {
                editing: editing.clone(),
            })
            .with_message(reply::ask_city())
        }

        // ============================================================
        // Gender and age
        // ============================================================
        (ConvState::AwaitGender { draft }, Command::ChooseGender(gender)) => match draft {
            Draft::FirstPass(city) => TransitionResult::new(ConvState::AwaitAge {
                draft: Draft::FirstPass((city.clone(), gender)),
            })
            .with_message(reply::ask_age()),
            Draft::Editing(criteria) => confirm_data(Criteria {
                gender,
                ..criteria.clone()
            }),
        },

        (ConvState::AwaitAge { draft }, Command::Text(text)) => match Age::parse(&text) {
            Ok(age) => {
                let criteria = match draft {
                    Draft::FirstPass((city, gender)) => Criteria {
                        city: city.clone(),
                        gender: *gender,
                        age,
                    },
                    Draft::Editing(criteria) => Criteria {
                        age,
                        ..criteria.clone()
                    },
                };
                confirm_data(criteria)
            }
            Err(_) => TransitionResult::unchanged(state).with_message(reply::invalid_age()),
        },

        // ============================================================
        // Confirmation and modification
        // ============================================================
        (ConvState::ConfirmData { criteria }, Command::ConfirmData) => {
            TransitionResult::unchanged(state)
                .with_message(reply::searching())
                .with_effect(Effect::Search {
                    criteria: criteria.clone(),
                })
        }

        (ConvState::ConfirmData { criteria }, Command::ModifyData) => {
            TransitionResult::new(ConvState::ModifySelect {
                criteria: criteria.clone(),
            })
            .with_message(reply::ask_modify_field())
        }

        (ConvState::ModifySelect { criteria }, Command::EditField(field)) => {
            let editing = criteria.clone();
            match field {
                Field::City => TransitionResult::new(ConvState::AwaitCity {
                    editing: Some(editing),
                })
                .with_message(reply::ask_city()),
                Field::Gender => TransitionResult::new(ConvState::AwaitGender {
                    draft: Draft::Editing(editing),
                })
                .with_message(reply::ask_gender()),
                Field::Age => TransitionResult::new(ConvState::AwaitAge {
                    draft: Draft::Editing(editing),
                })
                .with_message(reply::ask_age()),
            }
        }

        // ============================================================
        // Browsing and favorites
        // ============================================================
        (
            ConvState::Browsing { criteria, cursor } | ConvState::Favorites { criteria, cursor },
            Command::Next,
        ) => {
            let mut cursor = cursor.clone();
            let shown = cursor.next().map(Effect::show_candidate);
            TransitionResult::new(ConvState::Browsing {
                criteria: criteria.clone(),
                cursor,
            })
            .with_effects(shown.into_iter().flatten())
        }

        (ConvState::Browsing { criteria, cursor }, Command::AddFavorite)
            if cursor.current().is_some() =>
        {
            let effects = cursor.current().map(|candidate| Effect::AddFavorite {
                candidate: candidate.clone(),
                criteria: criteria.clone(),
            });
            TransitionResult::unchanged(state).with_effects(effects)
        }

        (ConvState::Browsing { .. } | ConvState::Favorites { .. }, Command::ShowFavorites) => {
            TransitionResult::unchanged(state).with_effect(Effect::ListFavorites)
        }

        (ConvState::Favorites { .. }, Command::ClearFavorites) => {
            TransitionResult::unchanged(state).with_effect(Effect::ClearFavorites)
        }

        // ============================================================
        // Anything else: re-prompt the current step
        // ============================================================
        (state, _) => TransitionResult::unchanged(state).with_message(reprompt(state, context)),
    }
}

fn on_outcome(state: &ConvState, context: &SessionContext, outcome: Event) -> TransitionResult {
    match (state, outcome) {
        (ConvState::ConfirmData { criteria }, Event::SearchCompleted { candidates }) => {
            let cursor = ResultCursor::new(candidates);
            match cursor.current().map(Effect::show_candidate) {
                Some(shown) => TransitionResult::new(ConvState::Browsing {
                    criteria: criteria.clone(),
                    cursor,
                })
                .with_effects(shown),
                None => TransitionResult::new(ConvState::Idle)
                    .with_message(reply::no_matches())
                    .with_message(reply::greeting(context.banner_attachment.as_deref())),
            }
        }

        (ConvState::Browsing { .. }, Event::FavoriteAdded) => TransitionResult::unchanged(state)
            .with_message(reply::favorite_added())
            .with_message(reply::navigation()),

        (
            ConvState::Browsing { criteria, cursor } | ConvState::Favorites { criteria, cursor },
            Event::FavoritesListed { favorites },
        ) => {
            if favorites.is_empty() {
                TransitionResult::new(ConvState::Browsing {
                    criteria: criteria.clone(),
                    cursor: cursor.clone(),
                })
                .with_message(reply::no_favorites())
                .with_message(reply::navigation())
            } else {
                TransitionResult::new(ConvState::Favorites {
                    criteria: criteria.clone(),
                    cursor: cursor.clone(),
                })
                .with_effects(favorite_cards(&favorites))
                .with_message(reply::favorites_end())
            }
        }

        (ConvState::Favorites { criteria, cursor }, Event::FavoritesCleared) => {
            TransitionResult::new(ConvState::Browsing {
                criteria: criteria.clone(),
                cursor: cursor.clone(),
            })
            .with_message(reply::favorites_cleared())
            .with_message(reply::navigation())
        }

        // Stale outcome for a step the session already left
        (state, _) => TransitionResult::unchanged(state),
    }
}

fn confirm_data(criteria: Criteria) -> TransitionResult {
    let prompt = reply::confirm_data(&criteria);
    TransitionResult::new(ConvState::ConfirmData { criteria }).with_message(prompt)
}

fn favorite_cards(favorites: &[Candidate]) -> impl Iterator<Item = Effect> + '_ {
    favorites
        .iter()
        .map(|candidate| Effect::send(reply::candidate_card(candidate)))
}

/// Prompt for the step `state` is waiting on
fn reprompt(state: &ConvState, context: &SessionContext) -> OutgoingMessage {
    match state {
        ConvState::Idle | ConvState::Terminated => {
            reply::greeting(context.banner_attachment.as_deref())
        }
        ConvState::AwaitCity { .. } => reply::ask_city(),
        ConvState::ConfirmCity { city, .. } => reply::confirm_city(city),
        ConvState::AwaitGender { .. } => reply::ask_gender(),
        ConvState::AwaitAge { .. } => reply::ask_age(),
        ConvState::ConfirmData { criteria } => reply::confirm_data(criteria),
        ConvState::ModifySelect { .. } => reply::ask_modify_field(),
        ConvState::Browsing { .. } => reply::navigation(),
        ConvState::Favorites { .. } => reply::favorites_end(),
    }
}
