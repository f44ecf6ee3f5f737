//! In-app assistant. Remote answers when reachable, local knowledge base otherwise.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;
use shield_store::remote::{ChatReply, ChatRequest, ChatTurn, RemoteError, ShieldApiClient};

/// Turns of history forwarded with each question.
pub const MAX_HISTORY: usize = 10;

#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, RemoteError>;
}

#[async_trait]
impl ChatBackend for ShieldApiClient {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, RemoteError> {
        self.chat(request).await
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AssistantAnswer {
    pub message: String,
    pub sources: Vec<String>,
    pub offline: bool,
}

struct KnowledgeEntry {
    keywords: &'static [&'static str],
    answer: &'static str,
}

const KNOWLEDGE_BASE: &[KnowledgeEntry] = &[
    KnowledgeEntry {
        keywords: &["sia", "licence", "license", "badge"],
        answer: "All personnel need a valid SIA licence for the role they work. Upload your licence under Documents and keep the expiry date current; shifts cannot be claimed with an expired licence.",
    },
    KnowledgeEntry {
        keywords: &["claim", "job board", "available", "pick up"],
        answer: "Open the Job Board to see unclaimed shifts. Tap a shift to review the pay, then confirm to claim it. Shifts are first come, first served, so if someone else gets there first it will disappear from your list.",
    },
    KnowledgeEntry {
        keywords: &["check in", "check-in", "check out", "check-out", "gps", "location"],
        answer: "Use the Shift Tracker when you arrive. Check-in records your GPS location and time; check-out calculates your total hours automatically. Location permission is required.",
    },
    KnowledgeEntry {
        keywords: &["pay", "paid", "payment", "rate", "invoice", "stripe"],
        answer: "Pay is the hourly rate multiplied by the hours worked. Payouts go to the bank account connected in your payment settings once the venue confirms the shift.",
    },
    KnowledgeEntry {
        keywords: &["document", "insurance", "upload", "certificate"],
        answer: "Upload licences, certificates and insurance under Documents. Agencies and venues can see verified documents when reviewing your profile.",
    },
    KnowledgeEntry {
        keywords: &["cancel", "sick", "can't make"],
        answer: "If you can no longer work a claimed shift, contact the venue through the booking chat as early as possible so the shift can be reassigned.",
    },
];

const DEFAULT_ANSWER: &str = "I'm having trouble reaching the Shield assistant right now. You can ask about SIA licences, claiming shifts, checking in, payments or documents.";

/// Best keyword match from the bundled knowledge base.
pub fn local_answer(message: &str) -> &'static str {
    let lowered = message.to_lowercase();
    KNOWLEDGE_BASE
        .iter()
        .map(|entry| {
            let hits = entry.keywords.iter().filter(|k| lowered.contains(*k)).count();
            (hits, entry)
        })
        .filter(|(hits, _)| *hits > 0)
        .max_by_key(|(hits, _)| *hits)
        .map(|(_, entry)| entry.answer)
        .unwrap_or(DEFAULT_ANSWER)
}

/// One-shot question with caller-supplied history.
pub async fn answer(
    backend: &dyn ChatBackend,
    user_role: &str,
    message: &str,
    history: &[ChatTurn],
) -> AssistantAnswer {
    let start = history.len().saturating_sub(MAX_HISTORY);
    let request = ChatRequest {
        message: message.to_string(),
        user_role: user_role.to_string(),
        conversation_history: history[start..].to_vec(),
    };

    match backend.send(&request).await {
        Ok(reply) => AssistantAnswer {
            message: reply.message,
            sources: reply.sources.unwrap_or_default(),
            offline: false,
        },
        Err(e) => {
            warn!("Assistant unavailable, answering locally: {}", e);
            AssistantAnswer {
                message: local_answer(message).to_string(),
                sources: Vec::new(),
                offline: true,
            }
        }
    }
}

/// A conversation that remembers its own history.
pub struct Assistant {
    backend: Arc<dyn ChatBackend>,
    user_role: String,
    history: Vec<ChatTurn>,
}

impl Assistant {
    pub fn new(backend: Arc<dyn ChatBackend>, user_role: impl Into<String>) -> Self {
        Self { backend, user_role: user_role.into(), history: Vec::new() }
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub async fn ask(&mut self, message: &str) -> AssistantAnswer {
        let reply = answer(self.backend.as_ref(), &self.user_role, message, &self.history).await;

        self.history.push(ChatTurn { role: "user".to_string(), content: message.to_string() });
        self.history.push(ChatTurn { role: "assistant".to_string(), content: reply.message.clone() });
        if self.history.len() > MAX_HISTORY {
            let excess = self.history.len() - MAX_HISTORY;
            self.history.drain(..excess);
        }

        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        fail: bool,
        seen: Mutex<Vec<ChatRequest>>,
    }

    #[async_trait]
    impl ChatBackend for Recorder {
        async fn send(&self, request: &ChatRequest) -> Result<ChatReply, RemoteError> {
            self.seen.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(RemoteError::Status { status: 503, body: "down".into() });
            }
            Ok(ChatReply { message: format!("remote: {}", request.message), sources: Some(vec!["faq".into()]) })
        }
    }

    fn recorder(fail: bool) -> Arc<Recorder> {
        Arc::new(Recorder { fail, seen: Mutex::new(Vec::new()) })
    }

    #[test]
    fn test_local_answer_matching() {
        assert!(local_answer("How do I renew my SIA licence?").contains("SIA licence"));
        assert!(local_answer("when do I get PAID").contains("hourly rate"));
        assert!(local_answer("gps check in not working").contains("Shift Tracker"));
        assert_eq!(local_answer("tell me a joke"), DEFAULT_ANSWER);
    }

    #[tokio::test]
    async fn test_remote_answer() {
        let backend = recorder(false);
        let reply = answer(backend.as_ref(), "personnel", "hello", &[]).await;
        assert_eq!(reply.message, "remote: hello");
        assert_eq!(reply.sources, vec!["faq".to_string()]);
        assert!(!reply.offline);
    }

    #[tokio::test]
    async fn test_falls_back_when_remote_fails() {
        let backend = recorder(true);
        let reply = answer(backend.as_ref(), "personnel", "how do I claim a shift", &[]).await;
        assert!(reply.offline);
        assert!(reply.message.contains("Job Board"));
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let backend = recorder(false);
        let mut assistant = Assistant::new(backend.clone(), "venue");

        for i in 0..8 {
            assistant.ask(&format!("question {}", i)).await;
        }

        assert_eq!(assistant.history().len(), MAX_HISTORY);
        assert_eq!(assistant.history().last().unwrap().content, "remote: question 7");

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 8);
        assert!(seen.iter().all(|r| r.conversation_history.len() <= MAX_HISTORY));
        assert_eq!(seen[7].user_role, "venue");
    }
}
