//! Reference model for model-based testing.
//!
//! The model captures what a session must do without how the driver does
//! it. It serves as the oracle against which the real driver is verified.
//!
//! # Design Principles
//!
//! - Simplicity: the model should be obviously correct
//! - Deterministic: same inputs produce same outputs

pub mod operation;
mod session;

pub use operation::{
    Choice, ENTITY_SPACE, Operation, OperationError, OperationResult, SmallSnapshot, entity,
};
pub use session::{INJECTED_FAILURE, ModelSession, ObservableState};
