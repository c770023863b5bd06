//! Diagnosis evaluation.
//!
//! Judges whether the patient's reply confirms the doctor's guess. The
//! check is a deliberately simple substring match, isolated here so a
//! structured contract with the generation service could replace it
//! without touching the orchestrator.

use bedside_core::types::TurnCategory;

/// Confirmation markers scanned for in the lower-cased reply.
const CONFIRMATION_MARKERS: [&str; 2] = ["yes", "correct"];

/// True only when the turn was a diagnosis guess and the reply contains
/// a confirmation marker.
pub fn evaluate(category: TurnCategory, reply: &str) -> bool {
    if category != TurnCategory::DiagnosisGuess {
        return false;
    }
    let reply = reply.to_lowercase();
    CONFIRMATION_MARKERS.iter().any(|m| reply.contains(m))
}
