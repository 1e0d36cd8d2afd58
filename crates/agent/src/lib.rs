//! Chat runtime for the portfolio assistant.
//!
//! This crate turns one visitor message into rendered replies:
//! - screens it through the input guard (`guardrails`)
//! - resolves what to say: offer handling, lead capture, remote answer or
//!   canned fallback (`conversation`)
//! - paces and renders the replies (`pacing`, `render`)
//! - hands completed leads to the notification sink (`notify`)
//!
//! # Seams
//!
//! - `AnswerSource` - the remote question-answering service
//! - `NotificationSink` - e-mail delivery and spreadsheet logging
//! - `ChatRenderer` - the page (or terminal) that shows the bubbles
//!
//! # Safety Principle
//!
//! Remote answers are display text only. Starting capture, accepting lead
//! fields and enforcing quotas are deterministic decisions made here and in
//! the core crate.

pub mod conversation;
pub mod guardrails;
pub mod llm;
pub mod notify;
pub mod pacing;
pub mod render;
pub mod runtime;
pub mod session;

pub use conversation::{Resolution, ResolutionKind, ResponseResolver};
pub use guardrails::{DenyReason, GuardrailDecision, GuardrailPolicy};
pub use llm::{AnswerReply, AnswerRequest, AnswerSource, RemoteAnswerError, UnavailableAnswerSource};
pub use notify::{EmailTemplateParams, LogOnlySink, NotificationError, NotificationSink};
pub use pacing::{Pace, Pacer};
pub use render::{ChatRenderer, RenderedMessage, Role, Transcript};
pub use runtime::{ChatRuntime, TurnOutcome, TurnReport};
pub use session::ChatSession;
