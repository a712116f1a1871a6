//! Input surfaces
//!
//! Concrete [`ValueResolver`](super::ValueResolver) and
//! [`Continuation`](super::Continuation) implementations: a line-oriented
//! terminal and a JSON answer sheet.

pub mod batch;
pub mod interactive;

pub use batch::{AnswerSheet, BatchSurface};
pub use interactive::InteractiveSurface;
