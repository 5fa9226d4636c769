//! Chat transcript synchronisation.
//!
//! The transcript shown to the user (with ids) and the plain history sent
//! as conversational context are kept separately. A translation replaces
//! the displayed transcript; the history always holds what was actually
//! exchanged with the service.

use crate::catalogue::BRAND;
use crate::i18n::Language;
use crate::llm::ChatTurn;
use crate::records::{ChatMessage, ChatRole, ChatTranscript};
use serde::Serialize;

/// A transcript translation to run outside the session lock.
#[derive(Debug, Clone)]
pub struct ChatJob {
    version: u64,
    pub language: Language,
    pub transcript: ChatTranscript,
}

/// What became of a finished transcript translation.
#[derive(Debug)]
pub enum ChatCommit {
    Applied,
    /// A newer target was chosen; its own job will land.
    Dropped,
    /// Messages arrived while it ran; translate the current transcript instead.
    Retry(ChatJob),
}

#[derive(Debug)]
pub struct ChatState {
    transcript: ChatTranscript,
    history: Vec<ChatTurn>,
    next_id: u64,
    /// Bumped whenever a message is added
    version: u64,
    target: Language,
    translating: Option<Language>,
    sending: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatView {
    pub messages: ChatTranscript,
    pub sending: bool,
    pub translating: bool,
}

impl ChatState {
    /// Start a conversation with the assistant's greeting.
    pub fn new(greeting: impl Into<String>, language: Language) -> Self {
        let mut transcript = ChatTranscript::new();
        transcript.push(ChatMessage {
            id: 1,
            role: ChatRole::Assistant,
            text: greeting.into(),
        });
        Self {
            transcript,
            history: Vec::new(),
            next_id: 2,
            version: 0,
            target: language,
            translating: None,
            sending: false,
        }
    }

    pub fn transcript(&self) -> &ChatTranscript {
        &self.transcript
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Only the greeting is present, so a language change can reuse the
    /// UI text for it instead of a transcript translation.
    pub fn is_greeting_only(&self) -> bool {
        self.transcript.is_greeting_only()
            && self
                .transcript
                .messages()
                .first()
                .is_some_and(|m| m.text.contains(BRAND))
    }

    pub fn substitute_greeting(&mut self, greeting: &str) {
        self.transcript.replace_first_text(greeting.to_string());
    }

    fn push(&mut self, role: ChatRole, text: String) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.version += 1;
        self.transcript.push(ChatMessage { id, role, text });
        id
    }

    /// Show the user's message and mark a reply as outstanding.
    pub fn push_user(&mut self, text: impl Into<String>) -> u64 {
        self.sending = true;
        self.push(ChatRole::User, text.into())
    }

    /// Show the assistant's reply and remember the exchange as context.
    pub fn push_reply(&mut self, sent: String, reply: String) -> u64 {
        self.sending = false;
        self.history.push(ChatTurn {
            role: ChatRole::User,
            text: sent,
        });
        self.history.push(ChatTurn {
            role: ChatRole::Assistant,
            text: reply.clone(),
        });
        self.push(ChatRole::Assistant, reply)
    }

    /// Show an apology; nothing is added to the history.
    pub fn push_failure(&mut self, apology: &str) -> u64 {
        self.sending = false;
        self.push(ChatRole::Assistant, apology.to_string())
    }

    /// Make `language` the target. Returns a job when the transcript must go
    /// through the gateway, None when the greeting substitution suffices.
    pub fn begin_translation(&mut self, language: Language) -> Option<ChatJob> {
        self.target = language;
        if self.is_greeting_only() {
            self.translating = None;
            return None;
        }
        self.translating = Some(language);
        Some(ChatJob {
            version: self.version,
            language,
            transcript: self.transcript.clone(),
        })
    }

    /// Apply a finished translation. A newer target drops it; a message that
    /// arrived meanwhile asks for the whole transcript again.
    pub fn commit_translation(&mut self, job: ChatJob, translated: ChatTranscript) -> ChatCommit {
        if job.language != self.target {
            return ChatCommit::Dropped;
        }
        if job.version != self.version {
            return ChatCommit::Retry(ChatJob {
                version: self.version,
                language: self.target,
                transcript: self.transcript.clone(),
            });
        }
        self.translating = None;
        self.transcript = translated;
        ChatCommit::Applied
    }

    pub fn view(&self) -> ChatView {
        ChatView {
            messages: self.transcript.clone(),
            sending: self.sending,
            translating: self.translating.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::GREETING;

    fn translated(transcript: &ChatTranscript, suffix: &str) -> ChatTranscript {
        let mut out = ChatTranscript::new();
        for message in transcript.messages() {
            out.push(ChatMessage {
                text: format!("{}{}", message.text, suffix),
                ..message.clone()
            });
        }
        out
    }

    // ==================== Greeting Tests ====================

    #[test]
    fn test_greeting_only_substitution() {
        let mut chat = ChatState::new(GREETING, Language::ENGLISH);
        assert!(chat.is_greeting_only());
        assert!(chat.begin_translation(Language::HINDI).is_none());

        chat.substitute_greeting("नमस्ते! मैं FarmX सहायक हूँ।");
        assert_eq!(chat.transcript().messages()[0].text, "नमस्ते! मैं FarmX सहायक हूँ।");
        assert_eq!(chat.transcript().messages()[0].id, 1);
    }

    #[test]
    fn test_greeting_without_brand_needs_translation() {
        let mut chat = ChatState::new("Hello there", Language::ENGLISH);
        assert!(!chat.is_greeting_only());
        assert!(chat.begin_translation(Language::HINDI).is_some());
    }

    // ==================== Exchange Tests ====================

    #[test]
    fn test_exchange_updates_history_and_ids() {
        let mut chat = ChatState::new(GREETING, Language::ENGLISH);
        let user_id = chat.push_user("When to sow wheat?");
        assert!(chat.is_sending());
        let reply_id = chat.push_reply(
            "[Context: ...] When to sow wheat?".to_string(),
            "- November".to_string(),
        );

        assert_eq!((user_id, reply_id), (2, 3));
        assert!(!chat.is_sending());
        assert_eq!(chat.history().len(), 2);
        assert_eq!(chat.history()[0].text, "[Context: ...] When to sow wheat?");
        assert_eq!(chat.transcript().messages()[1].text, "When to sow wheat?");
        assert!(!chat.is_greeting_only());
    }

    #[test]
    fn test_failure_is_not_history() {
        let mut chat = ChatState::new(GREETING, Language::ENGLISH);
        chat.push_user("hi");
        chat.push_failure("Sorry, something went wrong.");
        assert!(chat.history().is_empty());
        assert_eq!(chat.transcript().len(), 3);
    }

    // ==================== Translation Tests ====================

    #[test]
    fn test_translation_applies() {
        let mut chat = ChatState::new(GREETING, Language::ENGLISH);
        chat.push_user("hi");
        chat.push_reply("hi".to_string(), "hello".to_string());

        let job = chat.begin_translation(Language::HINDI).unwrap();
        assert!(chat.view().translating);
        let out = translated(&job.transcript, " (hi)");
        assert!(matches!(chat.commit_translation(job, out), ChatCommit::Applied));
        assert!(!chat.view().translating);
        assert_eq!(chat.transcript().messages()[1].text, "hi (hi)");
    }

    #[test]
    fn test_translation_reissued_after_new_message() {
        let mut chat = ChatState::new(GREETING, Language::ENGLISH);
        chat.push_user("hi");
        let job = chat.begin_translation(Language::HINDI).unwrap();
        chat.push_failure("Sorry");

        let out = translated(&job.transcript, " (hi)");
        let ChatCommit::Retry(retry) = chat.commit_translation(job, out) else {
            panic!("expected the transcript to be translated again");
        };
        assert_eq!(retry.language, Language::HINDI);
        assert_eq!(retry.transcript.len(), 3);
        assert!(chat.view().translating);
        assert_eq!(chat.transcript().messages()[1].text, "hi");

        let out = translated(&retry.transcript, " (hi)");
        assert!(matches!(chat.commit_translation(retry, out), ChatCommit::Applied));
        assert!(!chat.view().translating);
        assert_eq!(chat.transcript().messages()[2].text, "Sorry (hi)");
    }

    #[test]
    fn test_older_target_loses() {
        let mut chat = ChatState::new(GREETING, Language::ENGLISH);
        chat.push_user("hi");
        let tamil = chat.begin_translation(Language::TAMIL).unwrap();
        let hindi = chat.begin_translation(Language::HINDI).unwrap();

        let hindi_out = translated(&hindi.transcript, " (hi)");
        let tamil_out = translated(&tamil.transcript, " (ta)");
        assert!(matches!(chat.commit_translation(hindi, hindi_out), ChatCommit::Applied));
        assert!(matches!(chat.commit_translation(tamil, tamil_out), ChatCommit::Dropped));
        assert_eq!(chat.transcript().messages()[1].text, "hi (hi)");
    }
}
