//! Turn classification.
//!
//! Decides what the engine should do with an incoming doctor utterance.
//! Classification is a coarse lexical heuristic over the newest doctor
//! turn; it is pure and derived fresh on every turn, never stored.

use bedside_core::types::{Turn, TurnCategory};

/// Phrases that mark a doctor utterance as a diagnosis guess.
const GUESS_MARKERS: [&str; 5] = [
    "i think",
    "is it",
    "could it be",
    "do you have",
    "are you having",
];

/// Classify the next action for an incoming turn.
///
/// `is_new_session` forces `NewSession` regardless of history content.
/// Otherwise the most recent doctor turn is lower-cased and scanned for
/// the guess markers; an empty history (or one with no doctor turn yet)
/// scans the empty string and falls through to `RegularInquiry`.
pub fn classify(history: &[Turn], is_new_session: bool) -> TurnCategory {
    if is_new_session {
        return TurnCategory::NewSession;
    }

    let latest = history
        .iter()
        .rev()
        .find(|t| t.speaker == bedside_core::types::Speaker::Doctor)
        .map(|t| t.text.to_lowercase())
        .unwrap_or_default();

    if GUESS_MARKERS.iter().any(|m| latest.contains(m)) {
        TurnCategory::DiagnosisGuess
    } else {
        TurnCategory::RegularInquiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctor_says(text: &str) -> Vec<Turn> {
        vec![Turn::doctor(text)]
    }

    #[test]
    fn test_new_session_flag_wins_over_content() {
        assert_eq!(
            classify(&doctor_says("is it the flu?"), true),
            TurnCategory::NewSession
        );
        assert_eq!(classify(&[], true), TurnCategory::NewSession);
    }

    #[test]
    fn test_each_marker_yields_guess() {
        for text in [
            "I think it's pneumonia",
            "Is it the flu?",
            "Could it be strep throat?",
            "Do you have a fever?",
            "Are you having chest pain?",
        ] {
            assert_eq!(
                classify(&doctor_says(text), false),
                TurnCategory::DiagnosisGuess,
                "expected guess for: {}",
                text
            );
        }
    }

    #[test]
    fn test_marker_matching_is_case_insensitive() {
        assert_eq!(
            classify(&doctor_says("IS IT THE FLU?"), false),
            TurnCategory::DiagnosisGuess
        );
    }

    #[test]
    fn test_no_marker_is_regular_inquiry() {
        assert_eq!(
            classify(&doctor_says("I have a headache"), false),
            TurnCategory::RegularInquiry
        );
        assert_eq!(
            classify(&doctor_says("Tell me more about the pain"), false),
            TurnCategory::RegularInquiry
        );
    }

    #[test]
    fn test_only_the_latest_doctor_turn_is_scanned() {
        let history = vec![
            Turn::doctor("is it the flu?"),
            Turn::patient("No, I don't think so."),
            Turn::doctor("okay, describe the cough then"),
        ];
        assert_eq!(classify(&history, false), TurnCategory::RegularInquiry);
    }

    #[test]
    fn test_patient_turns_are_ignored() {
        let history = vec![
            Turn::doctor("how long has this lasted?"),
            Turn::patient("Do you have any idea what it is, doctor?"),
        ];
        assert_eq!(classify(&history, false), TurnCategory::RegularInquiry);
    }

    #[test]
    fn test_empty_history_without_flag_is_regular_inquiry() {
        assert_eq!(classify(&[], false), TurnCategory::RegularInquiry);
    }
}
