//! Document generation
//!
//! Collects mandatory values through an input surface, assembles them
//! into a document tree, serializes it and validates the bytes against
//! the schema they came from.

pub mod adapters;
pub mod assembler;
pub mod collector;
pub mod outline;
pub mod pipeline;
pub mod repetition;
pub mod resolver;
pub mod serializer;
pub mod values;

pub use adapters::{AnswerSheet, BatchSurface, InteractiveSurface};
pub use assembler::assemble;
pub use collector::Collector;
pub use outline::{outline, OutlineKind, OutlineNode};
pub use pipeline::{default_root, GenerationOutcome, Generator, Stage};
pub use repetition::{collect_repeating, repetition_bound};
pub use resolver::{Continuation, InputSurface, LeafField, Paired, Section, SingleInstance, ValueResolver};
pub use serializer::Serializer;
pub use values::ValueNode;
