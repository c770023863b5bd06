//! Bedside dialogue crate - the conversation engine.
//!
//! Classifies each incoming doctor turn, assembles the patient prompt,
//! calls the generation service, judges diagnosis confirmation, and
//! keeps the session tiers up to date.

pub mod classifier;
pub mod error;
pub mod evaluator;
pub mod gateway;
pub mod orchestrator;
pub mod prompt;

pub use classifier::classify;
pub use error::DialogueError;
pub use evaluator::evaluate;
pub use gateway::{Generator, HttpGenerator};
pub use orchestrator::{DialogueOrchestrator, TurnReply, APOLOGY_REPLY, MAX_MESSAGE_LEN};
pub use prompt::{assemble, ChatMessage, PATIENT_PERSONA};
