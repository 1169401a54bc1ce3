//! The Angel persona.
//!
//! Every chat request is answered the same way:
//!
//! 1. **Load** the stored student answers, if any
//! 2. **Assemble** the prompt: persona (+ student context), one-shot example, live message
//! 3. **Complete** through the retrying completion client
//!
//! There is no conversation history; each request stands alone.

pub mod persona;

pub use persona::{
    ANGEL_PERSONA, AngelPersona, ONE_SHOT_ASSISTANT, ONE_SHOT_USER, build_messages,
    render_student_context,
};
