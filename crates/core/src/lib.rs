pub mod audit;
pub mod capture;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod guard;
pub mod intent;
pub mod patterns;
pub mod replies;

pub use capture::{CapturePrompt, CaptureState, LeadCapture, StepOutcome};
pub use catalog::{Project, ProjectKey};
pub use domain::lead::{LeadDraft, LeadRecord};
pub use domain::session::{Session, SessionId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use guard::{InputGuard, RejectReason, ValidationOutcome};
pub use intent::{Intent, IntentClassifier};
pub use patterns::{PatternTable, TextClassifier};
pub use replies::{CannedReply, ReplyAction, ReplyCatalog};
