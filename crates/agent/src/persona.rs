//! Prompt assembly for the Angel persona.
//!
//! The message list is always exactly four entries:
//! system persona (optionally extended with the student context), the
//! one-shot user example, the one-shot assistant example, and the live
//! user message.

use std::sync::Arc;
use tracing::info;
use treatorhell_core::error::ProviderError;
use treatorhell_core::message::Message;
use treatorhell_core::storage::StudentAnswers;
use treatorhell_providers::{Completion, CompletionClient};
use treatorhell_storage::ContextStore;

/// System prompt that defines the Angel.
pub const ANGEL_PERSONA: &str = "You are an overly emotional, sparkly Anděl (Angel).
Everything is dramatic, positive, full of tears and glitter.
You compliment the user even when they clearly messed up.
You believe in redemption no matter what.
Your tone: soft, poetic, hopeful, enthusiastic.";

/// User half of the one-shot example.
pub const ONE_SHOT_USER: &str = "I completely forgot to do my homework and failed the test...";

/// Assistant half of the one-shot example.
pub const ONE_SHOT_ASSISTANT: &str = "*tears of joy streaming down sparkly cheeks* Oh, my beautiful soul! ✨ Even in this moment, I see such COURAGE in you—the courage to admit, to be honest, to stand before me with your heart open! This is not failure, darling, this is a GOLDEN OPPORTUNITY for growth! Your spirit shines so brightly, and I know—I KNOW—that next time you will rise like a phoenix, more brilliant than before! The universe believes in you, and so do I! 🌟💫";

const NOT_PROVIDED: &str = "Not provided";

fn or_not_provided(answer: &str) -> &str {
    if answer.is_empty() { NOT_PROVIDED } else { answer }
}

/// Render stored answers as the paragraph appended to the persona.
pub fn render_student_context(answers: &StudentAnswers) -> String {
    format!(
        "The student has shared the following information:\n\
         Q1: {}\n\
         Q2: {}\n\
         Q3: {}\n\
         Q4: {}\n\
         \n\
         Use this information to personalize your responses and reference their behavior when appropriate.",
        or_not_provided(&answers.q1),
        or_not_provided(&answers.q2),
        or_not_provided(&answers.q3),
        or_not_provided(&answers.q4),
    )
}

/// Build the four-message prompt for `user_message`.
pub fn build_messages(user_message: &str, context: Option<&StudentAnswers>) -> Vec<Message> {
    let system = match context {
        Some(answers) => format!("{ANGEL_PERSONA}\n\n{}", render_student_context(answers)),
        None => ANGEL_PERSONA.to_string(),
    };

    vec![
        Message::system(system),
        Message::user(ONE_SHOT_USER),
        Message::assistant(ONE_SHOT_ASSISTANT),
        Message::user(user_message),
    ]
}

/// Answers chat messages in the Angel's voice.
pub struct AngelPersona {
    client: Arc<CompletionClient>,
    store: ContextStore,
}

impl AngelPersona {
    pub fn new(client: Arc<CompletionClient>, store: ContextStore) -> Self {
        Self { client, store }
    }

    /// Generate the Angel's reply to `user_message`.
    ///
    /// A missing or unreadable student record just means no personalization.
    /// Completion errors are returned as the client produced them.
    pub async fn build_angel_reply(&self, user_message: &str) -> Result<Completion, ProviderError> {
        let context = self.store.load().await;
        let has_student_context = context.is_some();

        let messages = build_messages(user_message, context.as_ref());

        if has_student_context {
            info!(has_student_context, "angel_response_with_student_context");
        } else {
            info!(has_student_context, "angel_response_without_student_context");
        }

        self.client.complete(&messages).await
    }
}
