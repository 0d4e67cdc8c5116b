use super::states::JobState;
use thiserror::Error;

/// Errors raised by the export state machine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateMachineError {
    #[error("Invalid state transition from {from} on {event}")]
    InvalidTransition { from: JobState, event: &'static str },
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
