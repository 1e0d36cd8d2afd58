pub mod engine;
pub mod states;

pub use engine::{
    is_valid_email, is_valid_name, transition, CapturePrompt, CaptureTransitionError, LeadCapture,
    StepOutcome,
};
pub use states::{CaptureAction, CaptureEvent, CaptureState, TransitionOutcome};
