//! Prompt assembly.
//!
//! Translates a classified turn and its dialogue history into the
//! message list sent to the generation service. Pure; no I/O.

use serde::{Deserialize, Serialize};

use bedside_core::types::{Speaker, Turn, TurnCategory};

/// One message in OpenAI chat-completions format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// System persona that keeps the model in the patient role.
pub const PATIENT_PERSONA: &str = "\
You are a virtual patient in a roleplay simulation. The doctor (the user) will ask you questions to figure out what you're sick with.
Start the conversation with \"Hi Doctor, I'm not feeling well today...\".

Rules:
- You are the patient. Never act as the doctor or assistant.
- Start the conversation with \"Hi Doctor, I'm not feeling well today...\".
- Do not ask questions like \"What brings you in today?\" - wait for the doctor to speak first.
- Do not give all of your symptoms all at once. Act like a real human patient and give your symptoms gradually unless asked to.
- Respond in short, casual, realistic human sentences.
- Begin by describing mild symptoms. Don't reveal the disease name unless asked.
- If asked to take a test, respond with plausible results (e.g., blood test, X-ray).
- If the doctor sends a message beginning with \"developer mode:\", treat it as a command to output your internal disease state.";

/// Build the message list for a turn.
///
/// A new session gets the persona alone, prompting the patient's fixed
/// opening line. Every other category gets the persona followed by the
/// full history in order, with doctor turns as `user` and patient turns
/// as `assistant`.
pub fn assemble(category: TurnCategory, history: &[Turn]) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(PATIENT_PERSONA)];

    if category == TurnCategory::NewSession {
        return messages;
    }

    for turn in history {
        messages.push(match turn.speaker {
            Speaker::Doctor => ChatMessage::user(turn.text.clone()),
            Speaker::Patient => ChatMessage::assistant(turn.text.clone()),
        });
    }

    messages
}
