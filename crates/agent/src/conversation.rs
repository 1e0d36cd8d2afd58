use chrono::{DateTime, Utc};
use folio_core::capture::{CaptureTransitionError, StepOutcome};
use folio_core::domain::lead::LeadRecord;
use folio_core::guard::InputGuard;
use folio_core::intent::{Intent, IntentClassifier};
use folio_core::patterns::{PatternTable, TextClassifier};
use folio_core::replies::{ReplyAction, ReplyCatalog};
use serde::Serialize;
use tracing::{debug, warn};

use crate::llm::{AnswerRequest, AnswerSource};
use crate::pacing::Pace;
use crate::session::ChatSession;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    OfferDeclined,
    CaptureStarted,
    CaptureStartBlocked,
    CaptureStep,
    LeadReady,
    LeadQuotaBlocked,
    /// The capture machine refused a step and was reset.
    CaptureReset,
    RemoteAnswer,
    CannedAnswer,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub messages: Vec<String>,
    pub lead: Option<LeadRecord>,
    pub pace: Pace,
    pub kind: ResolutionKind,
    /// Set when this message started a capture.
    pub capture_intent: Option<Intent>,
}

impl Resolution {
    fn say(text: String, pace: Pace, kind: ResolutionKind) -> Self {
        Self { messages: vec![text], lead: None, pace, kind, capture_intent: None }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OfferReply {
    Accept,
    Decline,
}

/// Decides what to say to an accepted, on-topic message.
pub struct ResponseResolver<A> {
    classifier: IntentClassifier,
    replies: ReplyCatalog,
    guard: InputGuard,
    answers: A,
    offer_replies: PatternTable<OfferReply>,
    capture_offers: PatternTable<()>,
}

impl<A> ResponseResolver<A>
where
    A: AnswerSource,
{
    pub fn new(
        classifier: IntentClassifier,
        replies: ReplyCatalog,
        guard: InputGuard,
        answers: A,
    ) -> Self {
        let offer_replies = PatternTable::compile([
            (
                OfferReply::Accept,
                "(?i)^(yes|sure|okay|ok|yeah|yep|please|definitely|absolutely|yea|ya)",
            ),
            (OfferReply::Decline, r"(?i)^(no|nope|nah|not\s*now|later|maybe|not\s*yet)"),
        ]);
        let capture_offers = PatternTable::compile([
            ((), "(?i)would you like (me to |to )?(share|pass|send|connect|take) (your|you)"),
            ((), "(?i)share your (info|contact|email|details)"),
            ((), "(?i)can i (get|take|have) your (info|contact|email|name)"),
        ]);

        Self { classifier, replies, guard, answers, offer_replies, capture_offers }
    }

    pub fn replies(&self) -> &ReplyCatalog {
        &self.replies
    }

    /// True when a remote answer is itself offering to collect contact
    /// details.
    pub fn suggests_capture(&self, answer: &str) -> bool {
        self.capture_offers.matches(answer)
    }

    pub async fn respond(
        &self,
        chat: &mut ChatSession,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Resolution, CaptureTransitionError> {
        if let Some(offered) = chat.pending_offer.take() {
            match self.offer_replies.first_match(text) {
                Some(OfferReply::Accept) => {
                    return self.start_capture(chat, offered, now, Pace::Offer);
                }
                Some(OfferReply::Decline) => {
                    return Ok(Resolution::say(
                        self.replies.decline(),
                        Pace::Offer,
                        ResolutionKind::OfferDeclined,
                    ));
                }
                None => {
                    debug!(
                        event_name = "chat.offer.dropped",
                        session_id = %chat.id(),
                        offered = %offered,
                        "ambiguous reply to capture offer"
                    );
                }
            }
        }

        if chat.capture.is_collecting() {
            match chat.capture.process_step(text)? {
                StepOutcome::Continue(prompt) => {
                    return Ok(Resolution::say(
                        self.replies.capture_prompt(&prompt),
                        Pace::Capture,
                        ResolutionKind::CaptureStep,
                    ));
                }
                StepOutcome::Complete(lead) => {
                    chat.capture.reset();
                    if !self.guard.can_submit_lead(&chat.session) {
                        return Ok(Resolution::say(
                            self.replies.already_submitted_on_complete(),
                            Pace::Capture,
                            ResolutionKind::LeadQuotaBlocked,
                        ));
                    }
                    return Ok(Resolution {
                        messages: Vec::new(),
                        lead: Some(lead),
                        pace: Pace::Capture,
                        kind: ResolutionKind::LeadReady,
                        capture_intent: None,
                    });
                }
                StepOutcome::Inactive => {}
            }
        }

        if let Some(intent) = self.classifier.detect_lead_intent(text) {
            if self.guard.can_submit_lead(&chat.session) {
                return self.start_capture(chat, intent, now, Pace::Offer);
            }
        }

        let request =
            AnswerRequest { message: text.to_string(), conversation_history: chat.history.clone() };
        match self.answers.answer(request).await {
            Ok(reply) => {
                let answer = reply.text().map(str::to_string);
                chat.history = reply.conversation_history;
                if let Some(answer) = answer {
                    if self.suggests_capture(&answer) {
                        chat.pending_offer = Some(Intent::Contact);
                    }
                    return Ok(Resolution::say(answer, Pace::None, ResolutionKind::RemoteAnswer));
                }
                debug!(
                    event_name = "chat.remote.fallback",
                    session_id = %chat.id(),
                    "remote answer was empty"
                );
            }
            Err(error) => {
                warn!(
                    event_name = "chat.remote.fallback",
                    session_id = %chat.id(),
                    error = %error,
                    "remote answer unavailable, using canned reply"
                );
            }
        }

        self.fallback(chat, text, now)
    }

    fn fallback(
        &self,
        chat: &mut ChatSession,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Resolution, CaptureTransitionError> {
        let intent = self.classifier.classify(text);
        let project = match intent {
            Intent::ProjectSpecific => self.classifier.detect_project(text),
            _ => None,
        };
        if let Some(key) = project {
            chat.project_interest = Some(key.title().to_string());
        }

        let reply = self.replies.fallback(intent, project);
        match reply.action {
            ReplyAction::StartCapture(capture_intent) => {
                if !self.guard.can_submit_lead(&chat.session) {
                    return Ok(Resolution::say(
                        self.replies.already_submitted_on_start(),
                        Pace::Random,
                        ResolutionKind::CaptureStartBlocked,
                    ));
                }
                self.start_capture(chat, capture_intent, now, Pace::Random)
            }
            ReplyAction::OfferCapture(offered) => {
                chat.pending_offer = Some(offered);
                Ok(Resolution::say(reply.text, Pace::Random, ResolutionKind::CannedAnswer))
            }
            ReplyAction::None => {
                Ok(Resolution::say(reply.text, Pace::Random, ResolutionKind::CannedAnswer))
            }
        }
    }

    fn start_capture(
        &self,
        chat: &mut ChatSession,
        intent: Intent,
        now: DateTime<Utc>,
        pace: Pace,
    ) -> Result<Resolution, CaptureTransitionError> {
        let project_interest = chat.project_interest.take();
        let prompt = chat.capture.start(intent, project_interest, now)?;
        Ok(Resolution {
            messages: vec![self.replies.capture_prompt(&prompt)],
            lead: None,
            pace,
            kind: ResolutionKind::CaptureStarted,
            capture_intent: Some(intent),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use folio_core::capture::CaptureState;
    use folio_core::config::AppConfig;
    use folio_core::guard::InputGuard;
    use folio_core::intent::{Intent, IntentClassifier};
    use folio_core::replies::ReplyCatalog;
    use serde_json::json;

    use super::{ResolutionKind, ResponseResolver};
    use crate::llm::{
        AnswerReply, AnswerRequest, AnswerSource, RemoteAnswerError, UnavailableAnswerSource,
    };
    use crate::session::ChatSession;

    struct FixedAnswer {
        text: &'static str,
        seen: Mutex<Vec<AnswerRequest>>,
    }

    #[async_trait]
    impl AnswerSource for FixedAnswer {
        async fn answer(&self, request: AnswerRequest) -> Result<AnswerReply, RemoteAnswerError> {
            let turns = request.conversation_history.len();
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(request);
            }
            Ok(AnswerReply {
                response: Some(self.text.to_string()),
                conversation_history: vec![json!({ "turn": turns + 1 })],
            })
        }
    }

    /// Plays back one queued result per call; an empty queue means the
    /// service is down.
    struct ScriptedAnswers {
        replies: Mutex<VecDeque<Result<AnswerReply, RemoteAnswerError>>>,
    }

    impl ScriptedAnswers {
        fn new(replies: impl IntoIterator<Item = Result<AnswerReply, RemoteAnswerError>>) -> Self {
            Self { replies: Mutex::new(replies.into_iter().collect()) }
        }
    }

    #[async_trait]
    impl AnswerSource for ScriptedAnswers {
        async fn answer(&self, _request: AnswerRequest) -> Result<AnswerReply, RemoteAnswerError> {
            self.replies
                .lock()
                .ok()
                .and_then(|mut replies| replies.pop_front())
                .unwrap_or(Err(RemoteAnswerError::NotConfigured))
        }
    }

    fn resolver<A: AnswerSource>(answers: A) -> ResponseResolver<A> {
        let owner = AppConfig::default().owner;
        ResponseResolver::new(
            IntentClassifier::new(&owner.name),
            ReplyCatalog::new(owner),
            InputGuard::default(),
            answers,
        )
    }

    #[tokio::test]
    async fn contact_fallback_sets_pending_offer_and_yes_starts_capture() {
        let resolver = resolver(UnavailableAnswerSource);
        let mut chat = ChatSession::start(Utc::now());

        let offer = resolver.respond(&mut chat, "What's his LinkedIn?", Utc::now()).await.expect("resolves");
        assert_eq!(offer.kind, ResolutionKind::CannedAnswer);
        assert_eq!(chat.pending_offer(), Some(Intent::Contact));

        let started = resolver.respond(&mut chat, "yes please", Utc::now()).await.expect("resolves");
        assert_eq!(started.kind, ResolutionKind::CaptureStarted);
        assert_eq!(started.capture_intent, Some(Intent::Contact));
        assert_eq!(chat.capture().state(), CaptureState::AwaitingName);
        assert_eq!(chat.capture().draft().intent, Some(Intent::Contact));
        assert!(chat.pending_offer().is_none());
    }

    #[tokio::test]
    async fn declined_offer_gets_neutral_reply() {
        let resolver = resolver(UnavailableAnswerSource);
        let mut chat = ChatSession::start(Utc::now());
        resolver.respond(&mut chat, "what experience does he have", Utc::now()).await.expect("resolves");
        assert_eq!(chat.pending_offer(), Some(Intent::Question));

        let declined = resolver.respond(&mut chat, "not now", Utc::now()).await.expect("resolves");

        assert_eq!(declined.kind, ResolutionKind::OfferDeclined);
        assert_eq!(declined.messages, vec![resolver.replies().decline()]);
        assert!(chat.pending_offer().is_none());
        assert!(!chat.capture().is_collecting());
    }

    #[tokio::test]
    async fn ambiguous_offer_reply_is_handled_normally() {
        let resolver = resolver(UnavailableAnswerSource);
        let mut chat = ChatSession::start(Utc::now());
        resolver.respond(&mut chat, "how can I contact ilyas?", Utc::now()).await.expect("resolves");
        // Direct lead signal started capture; abandon it to test the offer path.
        chat.capture.reset();
        chat.pending_offer = Some(Intent::Contact);

        let reply = resolver.respond(&mut chat, "hello", Utc::now()).await.expect("resolves");

        assert_eq!(reply.kind, ResolutionKind::CannedAnswer);
        assert_eq!(reply.messages, vec![resolver.replies().greeting()]);
        assert!(chat.pending_offer().is_none());
    }

    #[tokio::test]
    async fn direct_lead_signal_starts_capture_without_offer() {
        let resolver = resolver(UnavailableAnswerSource);
        let mut chat = ChatSession::start(Utc::now());

        let reply = resolver.respond(&mut chat, "Can I book a call?", Utc::now()).await.expect("resolves");

        assert_eq!(reply.kind, ResolutionKind::CaptureStarted);
        assert_eq!(reply.capture_intent, Some(Intent::Schedule));
        assert_eq!(chat.capture().state(), CaptureState::AwaitingName);
    }

    #[tokio::test]
    async fn remote_answer_is_used_and_history_carried_forward() {
        let answers = FixedAnswer { text: "Ilyas builds RAG systems.", seen: Mutex::new(Vec::new()) };
        let resolver = resolver(answers);
        let mut chat = ChatSession::start(Utc::now());

        let first = resolver.respond(&mut chat, "What does he do?", Utc::now()).await.expect("resolves");
        resolver.respond(&mut chat, "Anything else?", Utc::now()).await.expect("resolves");

        assert_eq!(first.kind, ResolutionKind::RemoteAnswer);
        assert_eq!(first.messages, vec!["Ilyas builds RAG systems.".to_string()]);
        assert_eq!(chat.history(), &[json!({ "turn": 2 })]);
        assert!(chat.pending_offer().is_none());
    }

    #[tokio::test]
    async fn remote_answer_offering_capture_sets_contact_offer() {
        let answers = FixedAnswer {
            text: "Happy to help. Would you like me to share your details with Ilyas?",
            seen: Mutex::new(Vec::new()),
        };
        let resolver = resolver(answers);
        let mut chat = ChatSession::start(Utc::now());

        resolver.respond(&mut chat, "Is he available?", Utc::now()).await.expect("resolves");

        assert_eq!(chat.pending_offer(), Some(Intent::Contact));
    }

    #[tokio::test]
    async fn project_detail_is_remembered_for_next_capture() {
        let resolver = resolver(UnavailableAnswerSource);
        let mut chat = ChatSession::start(Utc::now());

        let detail = resolver.respond(&mut chat, "LuluBot?", Utc::now()).await.expect("resolves");
        assert!(detail.messages[0].starts_with("**LuluBot**"));
        assert_eq!(chat.pending_offer(), Some(Intent::Learn));

        resolver.respond(&mut chat, "sure", Utc::now()).await.expect("resolves");

        assert_eq!(chat.capture().draft().intent, Some(Intent::Learn));
        assert_eq!(chat.capture().draft().project_interest.as_deref(), Some("LuluBot"));
    }

    #[tokio::test]
    async fn project_interest_only_applies_to_the_next_capture() {
        let resolver = resolver(UnavailableAnswerSource);
        let mut chat = ChatSession::start(Utc::now());
        resolver.respond(&mut chat, "LuluBot?", Utc::now()).await.expect("resolves");
        resolver.respond(&mut chat, "sure", Utc::now()).await.expect("resolves");
        assert!(chat.project_interest().is_none());

        let mut completed = None;
        for step in ["Ann", "ann@example.com", "Acme", "Engineer", "Tell me about LuluBot"] {
            let reply = resolver.respond(&mut chat, step, Utc::now()).await.expect("resolves");
            completed = reply.lead;
        }
        let lead = completed.expect("capture completes");
        assert_eq!(lead.project_interest.as_deref(), Some("LuluBot"));

        let booking = resolver.respond(&mut chat, "I'd like to book a call", Utc::now()).await.expect("resolves");

        assert_eq!(booking.kind, ResolutionKind::CaptureStarted);
        assert_eq!(chat.capture().draft().intent, Some(Intent::Schedule));
        assert_eq!(chat.capture().draft().project_interest, None);
    }

    #[tokio::test]
    async fn failed_remote_call_keeps_history_and_uses_canned_reply() {
        let answers = ScriptedAnswers::new([
            Ok(AnswerReply {
                response: Some("He ships production ML.".to_string()),
                conversation_history: vec![json!({ "turn": 1 })],
            }),
            Err(RemoteAnswerError::Status(502)),
        ]);
        let resolver = resolver(answers);
        let mut chat = ChatSession::start(Utc::now());

        let first = resolver.respond(&mut chat, "What does he do?", Utc::now()).await.expect("resolves");
        assert_eq!(first.kind, ResolutionKind::RemoteAnswer);

        let second = resolver.respond(&mut chat, "hello", Utc::now()).await.expect("resolves");

        assert_eq!(second.kind, ResolutionKind::CannedAnswer);
        assert_eq!(second.messages, vec![resolver.replies().greeting()]);
        assert_eq!(chat.history(), &[json!({ "turn": 1 })]);
    }

    #[tokio::test]
    async fn blank_remote_reply_falls_back_to_canned_reply_for_intent() {
        let answers = ScriptedAnswers::new([Ok(AnswerReply {
            response: Some("  ".to_string()),
            conversation_history: vec![json!({ "turn": 1 })],
        })]);
        let resolver = resolver(answers);
        let mut chat = ChatSession::start(Utc::now());

        let reply = resolver.respond(&mut chat, "thanks", Utc::now()).await.expect("resolves");

        assert_eq!(reply.kind, ResolutionKind::CannedAnswer);
        assert_eq!(reply.messages, vec![resolver.replies().thanks()]);
        assert!(chat.pending_offer().is_none());
    }
}
