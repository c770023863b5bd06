//! Per-turn coordination.
//!
//! Drives one doctor turn end to end: classify, assemble, generate,
//! evaluate, persist. The caller has already verified the identity; the
//! orchestrator only ever sees the resolved username.
//!
//! Persistence is deliberately best-effort: a failed ephemeral write or
//! archive append is logged and swallowed so the doctor still gets the
//! patient's reply. Generation failure is the one soft failure the
//! caller sees, as a fixed apology reply with no cache mutation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use bedside_core::types::{DiagnosticRecord, Session, Turn};
use bedside_storage::{ArchiveRepository, SessionStore};

use crate::classifier::classify;
use crate::error::DialogueError;
use crate::evaluator::evaluate;
use crate::gateway::Generator;
use crate::prompt::assemble;

/// Upper bound on a single doctor utterance, in characters.
pub const MAX_MESSAGE_LEN: usize = 2000;

/// Reply substituted when the generation service fails.
pub const APOLOGY_REPLY: &str = "Sorry, something went wrong.";

/// Outcome of one handled turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReply {
    pub reply: String,
    pub diagnosis_confirmed: bool,
}

/// Coordinates the classifier, prompt assembler, gateway, evaluator, and
/// the two store tiers for a single identity's turns.
pub struct DialogueOrchestrator {
    generator: Arc<dyn Generator>,
    sessions: Arc<dyn SessionStore>,
    archive: ArchiveRepository,
}

impl DialogueOrchestrator {
    pub fn new(
        generator: Arc<dyn Generator>,
        sessions: Arc<dyn SessionStore>,
        archive: ArchiveRepository,
    ) -> Self {
        Self {
            generator,
            sessions,
            archive,
        }
    }

    /// Handle one incoming doctor turn.
    ///
    /// `history` is the dialogue up to and including the doctor's newest
    /// utterance. On success the patient's reply has been appended and
    /// the session written back; on generation failure the stores are
    /// untouched and the reply is the fixed apology.
    pub async fn handle_turn(
        &self,
        identity: &str,
        mut history: Vec<Turn>,
        is_new_session: bool,
    ) -> Result<TurnReply, DialogueError> {
        if !is_new_session && history.is_empty() {
            return Err(DialogueError::EmptyHistory);
        }
        if let Some(text) = history.iter().rev().find_map(|t| {
            (t.speaker == bedside_core::types::Speaker::Doctor).then_some(t.text.as_str())
        }) {
            let len = text.chars().count();
            if len > MAX_MESSAGE_LEN {
                return Err(DialogueError::MessageTooLong(len));
            }
        }

        let category = classify(&history, is_new_session);
        let messages = assemble(category, &history);

        let reply = match self.generator.generate(&messages).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(identity, error = %e, "Generation failed, answering with apology");
                return Ok(TurnReply {
                    reply: APOLOGY_REPLY.to_string(),
                    diagnosis_confirmed: false,
                });
            }
        };

        let confirmed = evaluate(category, &reply);

        // The confirmed flag never reverts once set on the live session.
        let previously_confirmed = match self.sessions.get(identity) {
            Ok(existing) => existing.map(|s| s.diagnosis_confirmed).unwrap_or(false),
            Err(e) => {
                warn!(identity, error = %e, "Session read failed, treating as absent");
                false
            }
        };

        history.push(Turn::patient(reply.clone()));
        let session = Session {
            identity: identity.to_string(),
            history,
            diagnosis_confirmed: previously_confirmed || confirmed,
        };

        if let Err(e) = self.sessions.put(&session) {
            warn!(identity, error = %e, "Session write failed, reply still returned");
        }

        if confirmed {
            let record = DiagnosticRecord::from_session(&session);
            match self.archive.archive(&record) {
                Ok(()) => info!(identity, record_id = %record.id, "Diagnosis confirmed"),
                Err(e) => {
                    warn!(identity, error = %e, "Archive write failed, reply still returned")
                }
            }
        }

        Ok(TurnReply {
            reply,
            diagnosis_confirmed: confirmed,
        })
    }

    /// The live session for an identity, if any. A failing ephemeral
    /// tier degrades to "no session".
    pub fn resume(&self, identity: &str) -> Option<Session> {
        match self.sessions.get(identity) {
            Ok(session) => session,
            Err(e) => {
                warn!(identity, error = %e, "Session read failed, treating as absent");
                None
            }
        }
    }

    /// Clear the live session for an identity.
    pub fn reset(&self, identity: &str) -> Result<(), DialogueError> {
        self.sessions.remove(identity)?;
        info!(identity, "Session reset");
        Ok(())
    }

    /// All archived diagnoses for an identity, newest first.
    pub fn archived(&self, identity: &str) -> Result<Vec<DiagnosticRecord>, DialogueError> {
        Ok(self.archive.list_by_identity(identity)?)
    }
}
