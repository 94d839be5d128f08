use async_trait::async_trait;
use log::warn;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{ watch, Mutex };
use tokio::time::{ sleep, Instant };

use crate::api::{ ApiClient, ApiError };
use crate::models::chat::{ ChatMessage, Speaker, Transcript };

pub const GREETING: &str = "Hello! I'm your Emergency AI Assistant. How can I help you today?";

/// Substituted when the remote chatbot cannot be reached.
pub const CONNECTION_TROUBLE_REPLY: &str =
    "Sorry, I'm having trouble connecting. Please try again later.";

/// Remote fallback for messages the local triage table does not cover.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn ask(&self, message: &str, profile_id: &str) -> Result<String, ApiError>;
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn ask(&self, message: &str, profile_id: &str) -> Result<String, ApiError> {
        self.ask_chatbot(message, profile_id).await
    }
}

struct TriageEntry {
    keywords: &'static [&'static str],
    reply: &'static str,
}

/// Fixed table evaluated top to bottom; the first entry whose keyword set
/// matches wins and the search stops there.
static TRIAGE_TABLE: &[TriageEntry] = &[
    TriageEntry {
        keywords: &["cpr", "resuscitation", "not breathing"],
        reply: "For CPR: place the heel of your hand on the center of the chest, interlock \
            your other hand on top, and push hard and fast about 2 inches deep at 100-120 \
            compressions per minute. Let the chest rise fully between compressions. If you \
            are trained, give 2 rescue breaths after every 30 compressions. Call emergency \
            services first if you have not already.",
    },
    TriageEntry {
        keywords: &["bleed", "blood loss", "hemorrhage"],
        reply: "For severe bleeding: apply firm, direct pressure on the wound with a clean \
            cloth or bandage and do not lift it to check. If blood soaks through, add more \
            material on top. Raise the injured limb above the heart if possible and keep \
            pressing until help arrives.",
    },
    TriageEntry {
        keywords: &["chok"],
        reply: "For choking: encourage the person to cough. If they cannot cough, speak, or \
            breathe, give 5 sharp back blows between the shoulder blades, then 5 abdominal \
            thrusts (Heimlich maneuver), and repeat. If they become unresponsive, start CPR \
            and call emergency services.",
    },
    TriageEntry {
        keywords: &["burn", "scald"],
        reply: "For burns: cool the burn under cool running water for at least 20 minutes. \
            Remove jewelry and loose clothing near the area, but never anything stuck to the \
            skin. Cover loosely with a clean, non-fluffy dressing. Do not apply ice, butter, \
            or creams. Seek medical help for large, deep, or facial burns.",
    },
    TriageEntry {
        keywords: &["fracture", "broken bone", "broken arm", "broken leg"],
        reply: "For a suspected fracture: keep the injured area still and support it in the \
            position found. Do not try to straighten it. Apply a cold pack wrapped in cloth \
            to reduce swelling. If the bone has pierced the skin, cover the wound but do not \
            press on the bone. Get medical help.",
    },
    TriageEntry {
        keywords: &["heart attack", "chest pain", "cardiac"],
        reply: "For a suspected heart attack: call emergency services immediately. Help the \
            person sit down, resting against something, with knees bent. Loosen tight \
            clothing. If they are not allergic, let them chew one adult aspirin. Stay with \
            them and be ready to start CPR if they stop responding.",
    },
    TriageEntry {
        keywords: &["stroke", "face drooping", "slurred"],
        reply: "For a suspected stroke, think FAST: Face drooping, Arm weakness, Speech \
            difficulty, Time to call emergency services. Note the time symptoms started, \
            keep the person comfortable, and do not give them anything to eat or drink.",
    },
    TriageEntry {
        keywords: &["sos"],
        reply: "The SOS button at the top of this page sends your current location to this \
            person's emergency contacts. It needs a location fix first, so if you see \
            \"Waiting for location data...\", give it a few seconds and press it again.",
    },
    TriageEntry {
        keywords: &["qr", "scan"],
        reply: "This page comes from a scanned Emergency QR code. It shows the person's \
            blood type, medical history, and emergency contacts so first responders can act \
            quickly. You can call any listed contact directly from the contacts section.",
    },
    TriageEntry {
        keywords: &["thank", "thanks"],
        reply: "You're welcome! Stay safe, and remember: for any real emergency, call your \
            local emergency services first.",
    },
];

/// Case-insensitive substring match against the triage table. Returns the
/// canned answer for the first matching entry, if any.
pub fn triage(input: &str) -> Option<&'static str> {
    let normalized = input.to_lowercase();
    TRIAGE_TABLE.iter()
        .find(|entry| entry.keywords.iter().any(|keyword| normalized.contains(keyword)))
        .map(|entry| entry.reply)
}

/// Local-first chat dispatcher. Known emergency topics are answered from the
/// triage table; everything else goes to the remote chatbot once. Concurrent
/// dispatches are not guarded; the owning screen serializes input.
pub struct Assistant {
    backend: Arc<dyn ChatBackend>,
    profile_id: String,
    transcript: Mutex<Transcript>,
    typing_tx: watch::Sender<bool>,
    typing_rx: watch::Receiver<bool>,
    min_reply_delay: Duration,
}

impl Assistant {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        profile_id: impl Into<String>,
        min_reply_delay: Duration
    ) -> Self {
        let mut transcript = Transcript::new();
        transcript.messages.push(ChatMessage::new(Speaker::Assistant, GREETING));
        let (typing_tx, typing_rx) = watch::channel(false);
        Self {
            backend,
            profile_id: profile_id.into(),
            transcript: Mutex::new(transcript),
            typing_tx,
            typing_rx,
            min_reply_delay,
        }
    }

    /// True while a dispatch is between user message and response.
    pub fn typing(&self) -> watch::Receiver<bool> {
        self.typing_rx.clone()
    }

    pub async fn transcript(&self) -> Vec<ChatMessage> {
        self.transcript.lock().await.messages.clone()
    }

    /// Appends the user message, resolves a reply (local table first, remote
    /// otherwise), appends it, and returns it. Local answers are held back by
    /// the minimum delay so they do not appear instantaneous.
    pub async fn dispatch(&self, input: &str) -> ChatMessage {
        self.append(Speaker::User, input).await;
        let _ = self.typing_tx.send(true);
        let started = Instant::now();

        let reply = match triage(input) {
            Some(local) => local.to_string(),
            None =>
                match self.backend.ask(input, &self.profile_id).await {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Chatbot request failed: {}", e);
                        CONNECTION_TROUBLE_REPLY.to_string()
                    }
                }
        };

        let elapsed = started.elapsed();
        if elapsed < self.min_reply_delay {
            sleep(self.min_reply_delay - elapsed).await;
        }

        let message = self.append(Speaker::Assistant, &reply).await;
        let _ = self.typing_tx.send(false);
        message
    }

    async fn append(&self, speaker: Speaker, text: &str) -> ChatMessage {
        let message = ChatMessage::new(speaker, text);
        self.transcript.lock().await.messages.push(message.clone());
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{ AtomicUsize, Ordering };

    struct CountingBackend {
        calls: AtomicUsize,
        reply: Result<&'static str, ()>,
    }

    impl CountingBackend {
        fn answering(reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                reply: Ok(reply),
            })
        }

        fn unreachable() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                reply: Err(()),
            })
        }
    }

    #[async_trait]
    impl ChatBackend for CountingBackend {
        async fn ask(&self, _message: &str, _profile_id: &str) -> Result<String, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .map(|r| r.to_string())
                .map_err(|_| ApiError::Server(503))
        }
    }

    fn assistant(backend: Arc<CountingBackend>) -> Assistant {
        Assistant::new(backend, "u1", Duration::from_millis(1))
    }

    #[test]
    fn triage_matches_are_case_insensitive() {
        assert!(triage("My friend is CHOKING on food").is_some());
        assert!(triage("how do i do Cpr?").is_some());
        assert!(triage("What's the weather like?").is_none());
    }

    #[test]
    fn first_matching_entry_wins() {
        // "cpr" sits above "sos" in the table, so a message containing both
        // gets the CPR answer.
        let reply = triage("should I press sos or start cpr first?").unwrap();
        assert!(reply.contains("compressions"));
    }

    #[tokio::test]
    async fn keyword_message_never_reaches_the_remote_chatbot() {
        let backend = CountingBackend::answering("remote");
        let bot = assistant(backend.clone());

        let reply = bot.dispatch("He is choking!").await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert!(reply.text.contains("back blows"));
    }

    #[tokio::test]
    async fn unknown_message_triggers_exactly_one_remote_call() {
        let backend = CountingBackend::answering("A remote answer.");
        let bot = assistant(backend.clone());

        let reply = bot.dispatch("tell me about volcano safety").await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(reply.text, "A remote answer.");
    }

    #[tokio::test]
    async fn backend_failure_substitutes_the_apology() {
        let backend = CountingBackend::unreachable();
        let bot = assistant(backend);

        let reply = bot.dispatch("unmatched question").await;
        assert_eq!(reply.text, CONNECTION_TROUBLE_REPLY);
    }

    #[tokio::test]
    async fn transcript_appends_user_then_response_in_order() {
        let backend = CountingBackend::answering("ok");
        let bot = assistant(backend);

        bot.dispatch("how do I treat a burn?").await;
        let transcript = bot.transcript().await;

        // greeting, user message, assistant reply
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[0].speaker, Speaker::Assistant);
        assert_eq!(transcript[1].speaker, Speaker::User);
        assert_eq!(transcript[1].text, "how do I treat a burn?");
        assert_eq!(transcript[2].speaker, Speaker::Assistant);
        assert!(transcript[2].text.contains("running water"));
    }

    #[tokio::test]
    async fn typing_flag_clears_after_dispatch() {
        let backend = CountingBackend::answering("ok");
        let bot = assistant(backend);
        let typing = bot.typing();

        assert!(!*typing.borrow());
        bot.dispatch("anything at all").await;
        assert!(!*typing.borrow());
    }
}
