//! Prompt assembly: persona + bounded history + new input.

use hinata_types::conversation::ConversationTurn;
use hinata_types::llm::{CompletionRequest, Message, MessageRole};
use uuid::Uuid;

/// Keep at most `window` turns of history, oldest first.
///
/// `exclude` drops the turn with that id (the user turn just recorded for the
/// current request) before the window is applied.
pub fn select_history(
    turns: Vec<ConversationTurn>,
    exclude: Option<Uuid>,
    window: usize,
) -> Vec<ConversationTurn> {
    let mut kept: Vec<ConversationTurn> = turns
        .into_iter()
        .filter(|t| Some(t.id) != exclude)
        .collect();
    let excess = kept.len().saturating_sub(window);
    kept.drain(..excess);
    kept
}

/// Build the completion request for one reply.
///
/// The persona goes in `system`; history follows in chronological order and
/// the new user input is always the last message. `model` is left empty and
/// filled per attempt by the fallback chain.
pub fn assemble_request(
    persona_prompt: &str,
    history: &[ConversationTurn],
    user_text: &str,
    max_tokens: u32,
    temperature: f64,
) -> CompletionRequest {
    let mut messages: Vec<Message> = history
        .iter()
        .map(|turn| Message::new(turn.role.into(), turn.text.clone()))
        .collect();
    messages.push(Message::new(MessageRole::User, user_text));

    CompletionRequest {
        model: String::new(),
        messages,
        system: Some(persona_prompt.to_string()),
        max_tokens,
        temperature: Some(temperature),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hinata_types::conversation::{ConversationId, TurnRole};

    fn turn(role: TurnRole, text: &str) -> ConversationTurn {
        ConversationTurn::new(ConversationId::from("c"), role, text)
    }

    #[test]
    fn test_select_history_drops_excluded_turn() {
        let a = turn(TurnRole::User, "a");
        let b = turn(TurnRole::Assistant, "b");
        let current = turn(TurnRole::User, "current");
        let current_id = current.id;

        let kept = select_history(vec![a, b, current], Some(current_id), 10);
        let texts: Vec<&str> = kept.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn test_select_history_keeps_most_recent() {
        let turns: Vec<_> = (0..6).map(|i| turn(TurnRole::User, &i.to_string())).collect();

        let kept = select_history(turns, None, 4);
        let texts: Vec<&str> = kept.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["2", "3", "4", "5"]);
    }

    #[test]
    fn test_select_history_zero_window() {
        let turns = vec![turn(TurnRole::User, "a")];
        assert!(select_history(turns, None, 0).is_empty());
    }

    #[test]
    fn test_assemble_request_order() {
        let history = vec![
            turn(TurnRole::User, "hi"),
            turn(TurnRole::Assistant, "hello"),
        ];

        let request = assemble_request("PERSONA", &history, "how are you", 200, 0.7);

        assert_eq!(request.system.as_deref(), Some("PERSONA"));
        assert_eq!(
            request.messages,
            vec![
                Message::new(MessageRole::User, "hi"),
                Message::new(MessageRole::Assistant, "hello"),
                Message::new(MessageRole::User, "how are you"),
            ]
        );
        assert_eq!(request.max_tokens, 200);
        assert_eq!(request.temperature, Some(0.7));
        assert!(request.model.is_empty());
    }

    #[test]
    fn test_assemble_request_without_history() {
        let request = assemble_request("PERSONA", &[], "hello?", 50, 1.0);
        assert_eq!(request.messages, vec![Message::new(MessageRole::User, "hello?")]);
    }
}
