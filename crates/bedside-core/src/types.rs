use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Who produced a dialogue turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// The human playing the doctor.
    Doctor,
    /// The simulated patient.
    Patient,
}

/// What the next action for an incoming doctor utterance is.
///
/// Derived from the dialogue history on every turn; never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnCategory {
    /// First turn after login or an explicit reset.
    NewSession,
    /// The doctor appears to be naming a diagnosis.
    DiagnosisGuess,
    /// An ordinary question or remark.
    RegularInquiry,
}

// =============================================================================
// Dialogue state
// =============================================================================

/// One message from either side of the consultation.
///
/// Immutable once appended to a history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    pub fn doctor(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Doctor,
            text: text.into(),
        }
    }

    pub fn patient(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Patient,
            text: text.into(),
        }
    }
}

/// Live dialogue state for one identity.
///
/// Owned by the ephemeral session tier while the consultation is in
/// progress. History is append-only; a full reset replaces the session
/// wholesale. `diagnosis_confirmed` transitions false to true exactly once
/// and never reverts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Verified username this session belongs to.
    pub identity: String,
    /// Ordered dialogue turns, oldest first.
    pub history: Vec<Turn>,
    pub diagnosis_confirmed: bool,
}

impl Session {
    /// Create an empty, unconfirmed session for an identity.
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            history: Vec::new(),
            diagnosis_confirmed: false,
        }
    }

    /// The text of the most recent doctor turn, or `None` if the doctor
    /// has not spoken yet.
    pub fn last_doctor_text(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .find(|t| t.speaker == Speaker::Doctor)
            .map(|t| t.text.as_str())
    }
}

/// An archived, confirmed-diagnosis conversation.
///
/// Write-once: created exactly when a turn's evaluation confirms the
/// diagnosis, owned by the durable tier thereafter, never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    pub id: Uuid,
    pub identity: String,
    /// Snapshot of the full history including the confirming reply.
    pub history: Vec<Turn>,
    pub diagnosis_confirmed: bool,
    pub created_at: DateTime<Utc>,
}

impl DiagnosticRecord {
    /// Snapshot a confirmed session into a new record.
    pub fn from_session(session: &Session) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity: session.identity.clone(),
            history: session.history.clone(),
            diagnosis_confirmed: true,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_constructors() {
        let t = Turn::doctor("any fever?");
        assert_eq!(t.speaker, Speaker::Doctor);
        assert_eq!(t.text, "any fever?");

        let t = Turn::patient("a little, yes");
        assert_eq!(t.speaker, Speaker::Patient);
    }

    #[test]
    fn test_speaker_serde_snake_case() {
        assert_eq!(serde_json::to_string(&Speaker::Doctor).unwrap(), "\"doctor\"");
        assert_eq!(
            serde_json::to_string(&Speaker::Patient).unwrap(),
            "\"patient\""
        );
    }

    #[test]
    fn test_session_new_is_empty_and_unconfirmed() {
        let s = Session::new("doctor");
        assert_eq!(s.identity, "doctor");
        assert!(s.history.is_empty());
        assert!(!s.diagnosis_confirmed);
    }

    #[test]
    fn test_last_doctor_text_none_when_silent() {
        let mut s = Session::new("doctor");
        assert!(s.last_doctor_text().is_none());
        s.history.push(Turn::patient("Hi Doctor..."));
        assert!(s.last_doctor_text().is_none());
    }

    #[test]
    fn test_last_doctor_text_picks_most_recent() {
        let mut s = Session::new("doctor");
        s.history.push(Turn::doctor("first"));
        s.history.push(Turn::patient("reply"));
        s.history.push(Turn::doctor("second"));
        assert_eq!(s.last_doctor_text(), Some("second"));
    }

    #[test]
    fn test_record_from_session_snapshots_history() {
        let mut s = Session::new("doctor");
        s.history.push(Turn::doctor("is it the flu?"));
        s.history.push(Turn::patient("Yes, that's correct!"));
        s.diagnosis_confirmed = true;

        let record = DiagnosticRecord::from_session(&s);
        assert_eq!(record.identity, "doctor");
        assert_eq!(record.history, s.history);
        assert!(record.diagnosis_confirmed);
    }

    #[test]
    fn test_turn_json_round_trip() {
        let t = Turn::doctor("do you have a cough?");
        let json = serde_json::to_string(&t).unwrap();
        let back: Turn = serde_json::from_str(&json).unwrap();
        assert_eq!(t, back);
    }
}
