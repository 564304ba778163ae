//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::reply::labels;
use super::state::*;
use super::*;
use crate::candidate::Candidate;
use crate::criteria::{validate_age, City, Criteria, Gender};
use crate::cursor::ResultCursor;
use crate::error::CollaboratorError;
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> SessionContext {
    SessionContext::new(7).with_banner(Some("photo-1_1".to_string()))
}

const ALL_LABELS: &[&str] = &[
    labels::GREET,
    labels::START,
    labels::FINISH,
    labels::RIGHT_CITY,
    labels::MODIFY_CITY,
    labels::BOY,
    labels::GIRL,
    labels::ALL_TRUE,
    labels::CHANGE_PARAMETERS,
    labels::CITY,
    labels::AGE,
    labels::GENDER,
    labels::NEXT,
    labels::ADD_FAVORITE,
    labels::FAVORITES,
    labels::CLEAR_FAVORITES,
];

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_city() -> impl Strategy<Value = City> {
    prop_oneof![
        Just("Москва"),
        Just("Санкт-Петербург"),
        Just("Kazan"),
        Just("Нижний Новгород"),
    ]
    .prop_map(|name| City::parse(name).unwrap())
}

fn arb_gender() -> impl Strategy<Value = Gender> {
    prop_oneof![Just(Gender::Male), Just(Gender::Female)]
}

fn arb_criteria() -> impl Strategy<Value = Criteria> {
    (arb_city(), arb_gender(), 0u32..120).prop_map(|(city, gender, age)| Criteria {
        city,
        gender,
        age: validate_age(&age.to_string()).unwrap(),
    })
}

fn arb_candidate() -> impl Strategy<Value = Candidate> {
    (
        1i64..1_000_000,
        proptest::option::of("[А-Яа-я]{1,10}"),
        proptest::option::of("[А-Яа-я]{1,10}"),
        proptest::collection::vec("https://pp\\.vk\\.me/[a-z]{6}\\.jpg", 0..4),
    )
        .prop_map(|(id, first, last, photos)| Candidate::new(id, first, last, photos))
}

fn arb_cursor() -> impl Strategy<Value = ResultCursor> {
    (proptest::collection::vec(arb_candidate(), 1..6), 0usize..6).prop_map(|(list, skip)| {
        let mut cursor = ResultCursor::new(list);
        for _ in 0..skip {
            cursor.next();
        }
        cursor
    })
}

fn arb_editing() -> impl Strategy<Value = Option<Criteria>> {
    proptest::option::of(arb_criteria())
}

fn arb_state() -> impl Strategy<Value = ConvState> {
    prop_oneof![
        Just(ConvState::Idle),
        Just(ConvState::Terminated),
        arb_editing().prop_map(|editing| ConvState::AwaitCity { editing }),
        (arb_city(), arb_editing()).prop_map(|(city, editing)| ConvState::ConfirmCity { city, editing }),
        prop_oneof![
            arb_city().prop_map(Draft::FirstPass),
            arb_criteria().prop_map(Draft::Editing),
        ]
        .prop_map(|draft| ConvState::AwaitGender { draft }),
        prop_oneof![
            (arb_city(), arb_gender()).prop_map(Draft::FirstPass),
            arb_criteria().prop_map(Draft::Editing),
        ]
        .prop_map(|draft| ConvState::AwaitAge { draft }),
        arb_criteria().prop_map(|criteria| ConvState::ConfirmData { criteria }),
        arb_criteria().prop_map(|criteria| ConvState::ModifySelect { criteria }),
        (arb_criteria(), arb_cursor()).prop_map(|(criteria, cursor)| ConvState::Browsing { criteria, cursor }),
        (arb_criteria(), arb_cursor()).prop_map(|(criteria, cursor)| ConvState::Favorites { criteria, cursor }),
    ]
}

fn arb_user_text() -> impl Strategy<Value = String> {
    prop_oneof![
        proptest::sample::select(ALL_LABELS).prop_map(String::from),
        "[a-zA-Zа-яА-Я -]{1,20}",
        "[0-9]{1,3}",
        ".{0,20}",
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        4 => arb_user_text().prop_map(|text| Event::UserMessage { text }),
        1 => proptest::collection::vec(arb_candidate(), 0..4)
            .prop_map(|candidates| Event::SearchCompleted { candidates }),
        1 => Just(Event::FavoriteAdded),
        1 => proptest::collection::vec(arb_candidate(), 0..4)
            .prop_map(|favorites| Event::FavoritesListed { favorites }),
        1 => Just(Event::FavoritesCleared),
        1 => "[a-z ]{1,20}".prop_map(|m| Event::CollaboratorFailed {
            error: CollaboratorError::network(m),
        }),
    ]
}

fn cursor_in_bounds(state: &ConvState) -> bool {
    match state {
        ConvState::Browsing { cursor, .. } | ConvState::Favorites { cursor, .. } => {
            !cursor.is_empty() && cursor.index().is_some_and(|i| i < cursor.len())
        }
        _ => true,
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Invariant 1: transition is deterministic
    #[test]
    fn prop_transition_deterministic(state in arb_state(), event in arb_event()) {
        let first = transition(&state, &test_context(), event.clone());
        let second = transition(&state, &test_context(), event);
        prop_assert_eq!(first, second);
    }

    // Invariant 2: any reachable sequence keeps the cursor in bounds
    #[test]
    fn prop_sequences_keep_cursor_valid(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut state = ConvState::Idle;
        for event in events {
            state = transition(&state, &test_context(), event).new_state;
            prop_assert!(cursor_in_bounds(&state), "cursor out of bounds in {:?}", state);
        }
    }

    // Invariant 3: every user message gets some response
    #[test]
    fn prop_user_message_never_silent(state in arb_state(), text in arb_user_text()) {
        let result = transition(&state, &test_context(), Event::UserMessage { text });
        prop_assert!(!result.effects.is_empty(), "no effects from {:?}", state);
    }

    // Invariant 4: finish terminates from any non-terminal state
    #[test]
    fn prop_finish_terminates(state in arb_state()) {
        prop_assume!(!state.is_terminal());
        let result = transition(&state, &test_context(), Event::user(labels::FINISH));
        prop_assert_eq!(result.new_state, ConvState::Terminated);
    }

    // Invariant 5: collaborator failures never move the session
    #[test]
    fn prop_collaborator_failure_keeps_state(state in arb_state(), message in "[a-z]{1,10}") {
        let result = transition(
            &state,
            &test_context(),
            Event::CollaboratorFailed { error: CollaboratorError::storage(message) },
        );
        prop_assert_eq!(&result.new_state, &state);
        prop_assert!(result.effects.iter().all(Effect::is_send));
    }

    // Invariant 6: non-numeric age input leaves criteria untouched
    #[test]
    fn prop_bad_age_keeps_state(
        city in arb_city(),
        gender in arb_gender(),
        text in "[a-zA-Z!?.]{1,10}",
    ) {
        let state = ConvState::AwaitAge { draft: Draft::FirstPass((city, gender)) };
        let result = transition(&state, &test_context(), Event::UserMessage { text });
        prop_assert_eq!(result.new_state, state);
        prop_assert_eq!(result.effects.len(), 1);
    }

    // Invariant 7: free text with digits never becomes a city
    #[test]
    fn prop_city_with_digits_rejected(word in "[а-я]{0,5}", digit in 0u8..10) {
        let state = ConvState::AwaitCity { editing: None };
        let text = format!("{word}{digit}");
        let result = transition(&state, &test_context(), Event::UserMessage { text });
        prop_assert_eq!(result.new_state, state);
    }

    // Invariant 8: search is only requested with complete criteria from ConfirmData
    #[test]
    fn prop_search_only_from_confirm_data(state in arb_state(), event in arb_event()) {
        let result = transition(&state, &test_context(), event);
        let searches = result.effects.iter().any(|e| matches!(e, Effect::Search { .. }));
        if searches {
            prop_assert!(
                matches!(state, ConvState::ConfirmData { .. }),
                "search requested from {:?}",
                state
            );
            prop_assert_eq!(result.new_state, state);
        }
    }
}
