//! Placeholder assistant.
//!
//! Replies echo the request so the dashboard can be exercised end to end
//! without any model behind it.

/// Model used when a chat request names none.
pub const DEFAULT_MODEL: &str = "gpt-4o";

pub fn respond(message: &str, model: &str) -> String {
    format!("This is a simulated reply from the {model} model. Your message was: '{message}'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_names_model_and_echoes_message() {
        let reply = respond("hello", "llama-3");
        assert!(reply.contains("llama-3"));
        assert!(reply.ends_with("'hello'"));
    }
}
