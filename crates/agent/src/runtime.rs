use std::sync::Arc;

use chrono::Utc;
use folio_core::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use folio_core::capture::{CaptureState, CaptureTransitionError};
use folio_core::config::AppConfig;
use folio_core::errors::{ApplicationError, DomainError};
use folio_core::domain::lead::LeadRecord;
use folio_core::guard::{InputGuard, RejectReason};
use folio_core::intent::IntentClassifier;
use folio_core::replies::ReplyCatalog;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::conversation::{Resolution, ResolutionKind, ResponseResolver};
use crate::guardrails::{DenyReason, GuardrailDecision, GuardrailPolicy};
use crate::llm::AnswerSource;
use crate::notify::NotificationSink;
use crate::pacing::{Pace, Pacer};
use crate::render::{ChatRenderer, Role};
use crate::session::ChatSession;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// Blank input; nothing was rendered or counted.
    Ignored,
    Rejected { reason: RejectReason },
    OffTopic,
    Answered { kind: ResolutionKind },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TurnReport {
    pub correlation_id: String,
    pub outcome: TurnOutcome,
    pub lead_delivered: bool,
}

/// Runs one visitor message through guard, resolver, renderer and
/// notification sink, in that order.
pub struct ChatRuntime<A, N> {
    guardrails: GuardrailPolicy,
    resolver: ResponseResolver<A>,
    notifier: N,
    pacer: Pacer,
    replies: ReplyCatalog,
    audit: Arc<dyn AuditSink>,
}

impl<A, N> ChatRuntime<A, N>
where
    A: AnswerSource,
    N: NotificationSink,
{
    pub fn new(config: &AppConfig, answers: A, notifier: N, audit: Arc<dyn AuditSink>) -> Self {
        let guard = InputGuard::new((&config.guard).into());
        let replies = ReplyCatalog::new(config.owner.clone());
        let resolver = ResponseResolver::new(
            IntentClassifier::new(&config.owner.name),
            replies.clone(),
            guard.clone(),
            answers,
        );

        Self {
            guardrails: GuardrailPolicy::new(guard, replies.clone()),
            resolver,
            notifier,
            pacer: Pacer::new(config.pacing.clone()),
            replies,
            audit,
        }
    }

    pub fn guardrails(&self) -> &GuardrailPolicy {
        &self.guardrails
    }

    pub async fn handle_message<R>(
        &self,
        chat: &mut ChatSession,
        text: &str,
        renderer: &mut R,
    ) -> TurnReport
    where
        R: ChatRenderer + ?Sized,
    {
        let correlation_id = Uuid::new_v4().to_string();
        let text = text.trim();
        if text.is_empty() {
            return TurnReport { correlation_id, outcome: TurnOutcome::Ignored, lead_delivered: false };
        }

        let now = Utc::now();
        chat.touch(now);
        let context = AuditContext::new(chat.id().clone(), correlation_id.clone());

        let sanitized = match self.guardrails.evaluate(&mut chat.session, text, now) {
            GuardrailDecision::Allow { sanitized } => sanitized,
            GuardrailDecision::Deny { reason, reason_code, user_message } => {
                renderer.append(Role::User, text);
                renderer.show_typing();
                self.pacer.wait(Pace::Guard).await;
                renderer.hide_typing();
                renderer.append(Role::Assistant, &user_message);

                info!(
                    event_name = "chat.guard.rejected",
                    session_id = %context.session_id,
                    correlation_id = %correlation_id,
                    reason_code,
                    message_length = text.chars().count(),
                    "visitor message refused"
                );
                let (event_type, outcome) = match reason {
                    DenyReason::Rejected(reason) => {
                        ("guard.rejected", TurnOutcome::Rejected { reason })
                    }
                    DenyReason::OffTopic => ("guard.off_topic", TurnOutcome::OffTopic),
                };
                self.audit.emit(
                    AuditEvent::new(&context, event_type, AuditCategory::Guard, AuditOutcome::Rejected)
                        .with_metadata("reason_code", reason_code),
                );
                return TurnReport { correlation_id, outcome, lead_delivered: false };
            }
        };

        renderer.append(Role::User, &sanitized);
        renderer.show_typing();

        let before = chat.capture.state();
        let resolution = match self.resolver.respond(chat, &sanitized, now).await {
            Ok(resolution) => resolution,
            Err(error) => self.recover_capture(chat, error, &context),
        };

        self.pacer.wait(resolution.pace).await;
        renderer.hide_typing();
        for message in &resolution.messages {
            renderer.append(Role::Assistant, message);
        }

        self.audit_resolution(&context, before, chat.capture.state(), &resolution);

        let lead_delivered = match resolution.lead {
            Some(lead) => self.submit_lead(chat, lead, renderer, &context).await,
            None => false,
        };

        TurnReport {
            correlation_id,
            outcome: TurnOutcome::Answered { kind: resolution.kind },
            lead_delivered,
        }
    }

    /// Final quota check, delivery and confirmation. Delivery failures are
    /// logged and never shown to the visitor. Returns whether the lead was
    /// handed to the sink.
    async fn submit_lead<R>(
        &self,
        chat: &mut ChatSession,
        lead: LeadRecord,
        renderer: &mut R,
        context: &AuditContext,
    ) -> bool
    where
        R: ChatRenderer + ?Sized,
    {
        let guard = self.guardrails.guard();
        if !guard.can_submit_lead(&chat.session) {
            renderer.append(Role::Assistant, &self.replies.already_submitted_on_complete());
            chat.capture.reset();
            self.audit.emit(AuditEvent::new(
                context,
                "lead.quota_blocked",
                AuditCategory::Lead,
                AuditOutcome::Rejected,
            ));
            return false;
        }

        guard.record_lead_submission(&mut chat.session);

        let email_sent = match self.notifier.send_email(&lead).await {
            Ok(()) => true,
            Err(error) => {
                warn!(
                    event_name = "notify.email.failed",
                    session_id = %context.session_id,
                    correlation_id = %context.correlation_id,
                    error = %error,
                    "lead e-mail was not delivered"
                );
                false
            }
        };
        let logged = match self.notifier.log_lead(&lead).await {
            Ok(()) => true,
            Err(error) => {
                warn!(
                    event_name = "notify.sheets.failed",
                    session_id = %context.session_id,
                    correlation_id = %context.correlation_id,
                    error = %error,
                    "lead was not logged to the sheet"
                );
                false
            }
        };

        renderer.append(Role::Assistant, &self.replies.confirmation(&lead));
        chat.capture.reset();

        info!(
            event_name = "chat.capture.completed",
            session_id = %context.session_id,
            correlation_id = %context.correlation_id,
            intent = %lead.intent,
            email_sent,
            logged,
            "lead submitted"
        );
        self.audit.emit(
            AuditEvent::new(context, "lead.submitted", AuditCategory::Lead, AuditOutcome::Success)
                .with_metadata("intent", lead.intent.as_str())
                .with_metadata("email_sent", email_sent.to_string())
                .with_metadata("logged", logged.to_string()),
        );
        true
    }

    /// Maps a capture failure to an internal error, resets the capture and
    /// answers with the generic assistant reply.
    fn recover_capture(
        &self,
        chat: &mut ChatSession,
        error: CaptureTransitionError,
        context: &AuditContext,
    ) -> Resolution {
        let failure = ApplicationError::from(DomainError::from(error));
        error!(
            event_name = "chat.capture.failed",
            session_id = %context.session_id,
            correlation_id = %context.correlation_id,
            error = %failure,
            "capture state could not be advanced; resetting"
        );
        let interface = failure.into_interface(context.correlation_id.clone());
        self.audit.emit(
            AuditEvent::new(context, "capture.failed", AuditCategory::Capture, AuditOutcome::Failed)
                .with_metadata("error", interface.to_string()),
        );
        chat.capture.reset();

        Resolution {
            messages: vec![self.replies.blocked()],
            lead: None,
            pace: Pace::Random,
            kind: ResolutionKind::CaptureReset,
            capture_intent: None,
        }
    }

    fn audit_resolution(
        &self,
        context: &AuditContext,
        before: CaptureState,
        after: CaptureState,
        resolution: &Resolution,
    ) {
        if let Some(intent) = resolution.capture_intent {
            self.audit.emit(
                AuditEvent::new(context, "capture.started", AuditCategory::Capture, AuditOutcome::Success)
                    .with_metadata("intent", intent.as_str()),
            );
        }
        if before != after {
            self.audit.emit(
                AuditEvent::new(
                    context,
                    "capture.transition_applied",
                    AuditCategory::Capture,
                    AuditOutcome::Success,
                )
                .with_metadata("from", format!("{before:?}"))
                .with_metadata("to", format!("{after:?}")),
            );
        }
        if resolution.kind == ResolutionKind::LeadQuotaBlocked {
            self.audit.emit(AuditEvent::new(
                context,
                "lead.quota_blocked",
                AuditCategory::Lead,
                AuditOutcome::Rejected,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use folio_core::audit::{AuditContext, AuditOutcome, InMemoryAuditSink};
    use folio_core::capture::{CaptureEvent, CaptureState, CaptureTransitionError};
    use folio_core::config::{AppConfig, PacingConfig};
    use folio_core::intent::Intent;

    use super::ChatRuntime;
    use crate::conversation::ResolutionKind;
    use crate::llm::UnavailableAnswerSource;
    use crate::notify::LogOnlySink;
    use crate::session::ChatSession;

    #[test]
    fn capture_failure_resets_and_answers_with_generic_reply() {
        let mut config = AppConfig::default();
        config.pacing = PacingConfig::instant();
        let audit = InMemoryAuditSink::default();
        let runtime =
            ChatRuntime::new(&config, UnavailableAnswerSource, LogOnlySink, Arc::new(audit.clone()));
        let mut chat = ChatSession::start(Utc::now());
        chat.capture.start(Intent::Schedule, None, Utc::now()).expect("capture starts");
        let context = AuditContext::new(chat.id().clone(), "req-9".to_string());

        let resolution = runtime.recover_capture(
            &mut chat,
            CaptureTransitionError::InvalidTransition {
                state: CaptureState::AwaitingName,
                event: CaptureEvent::RoleProvided,
            },
            &context,
        );

        assert_eq!(resolution.kind, ResolutionKind::CaptureReset);
        assert_eq!(resolution.messages, vec![runtime.replies.blocked()]);
        assert_eq!(chat.capture().state(), CaptureState::Idle);
        let events = audit.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "capture.failed");
        assert_eq!(events[0].outcome, AuditOutcome::Failed);
        assert_eq!(events[0].correlation_id, "req-9");
    }
}
