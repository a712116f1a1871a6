//! Input surface interfaces
//!
//! The collector asks a [`ValueResolver`] for every mandatory leaf and a
//! [`Continuation`] after every instance of a repeatable section. Both are
//! the only points where a run waits on the outside world; an interactive
//! terminal and a batch answer sheet implement the same pair.

use crate::error::Rejection;
use crate::namespaces::QName;

/// A mandatory leaf the collector needs a value for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafField {
    /// Instance path, repeated sections indexed from 1 (`Order/Entry[2]/Id`)
    pub path: String,
    /// Qualified element name
    pub name: QName,
    /// Allowed values in schema order, empty when unconstrained
    pub enumeration: Vec<String>,
    /// Whether an absent answer is rejected
    pub required: bool,
    /// Attempt number, starting at 1
    pub attempt: u32,
    /// Label of the leaf's type (`xs:int`, `Status`, ...)
    pub type_label: String,
}

impl LeafField {
    /// The path with repetition indexes removed (`Order/Entry/Id`)
    pub fn schema_path(&self) -> String {
        strip_indexes(&self.path)
    }

    /// Whether the value must come from the enumeration
    pub fn is_enumerated(&self) -> bool {
        !self.enumeration.is_empty()
    }
}

/// A repeatable section whose continuation is being decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Path of the section without its own index (`Order/Entry`)
    pub path: String,
    /// Qualified element name
    pub name: QName,
    /// Instances collected so far
    pub count: usize,
}

impl Section {
    /// The path with repetition indexes removed
    pub fn schema_path(&self) -> String {
        strip_indexes(&self.path)
    }
}

/// Remove every `[n]` segment suffix from a path
pub fn strip_indexes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut in_index = false;
    for c in path.chars() {
        match c {
            '[' => in_index = true,
            ']' => in_index = false,
            c if !in_index => out.push(c),
            _ => {}
        }
    }
    out
}

/// Supplies leaf values
pub trait ValueResolver {
    /// Produce a value for the field, or `None` when no value is given
    fn resolve(&mut self, field: &LeafField) -> Option<String>;

    /// Feedback after a value was rejected; the field will be asked again
    /// unless the retry policy is exhausted or the resolver is closed
    fn rejected(&mut self, _field: &LeafField, _rejection: &Rejection) {}

    /// Whether the resolver can no longer supply values
    fn is_closed(&self) -> bool {
        false
    }
}

/// Decides whether a repeatable section gets another instance
pub trait Continuation {
    /// Called once after each completed instance
    fn should_continue(&mut self, section: &Section) -> bool;
}

/// Both halves of an input surface
pub trait InputSurface: ValueResolver + Continuation {}

impl<T: ValueResolver + Continuation + ?Sized> InputSurface for T {}

impl<F> ValueResolver for F
where
    F: FnMut(&LeafField) -> Option<String>,
{
    fn resolve(&mut self, field: &LeafField) -> Option<String> {
        self(field)
    }
}

/// An input surface assembled from a separate resolver and continuation
#[derive(Debug, Clone)]
pub struct Paired<R, C> {
    /// Leaf values
    pub resolver: R,
    /// Repetition decisions
    pub continuation: C,
}

impl<R, C> Paired<R, C> {
    /// Pair a resolver with a continuation
    pub fn new(resolver: R, continuation: C) -> Self {
        Self { resolver, continuation }
    }
}

impl<R: ValueResolver, C> ValueResolver for Paired<R, C> {
    fn resolve(&mut self, field: &LeafField) -> Option<String> {
        self.resolver.resolve(field)
    }

    fn rejected(&mut self, field: &LeafField, rejection: &Rejection) {
        self.resolver.rejected(field, rejection);
    }

    fn is_closed(&self) -> bool {
        self.resolver.is_closed()
    }
}

impl<R, C: Continuation> Continuation for Paired<R, C> {
    fn should_continue(&mut self, section: &Section) -> bool {
        self.continuation.should_continue(section)
    }
}

impl<F> Continuation for F
where
    F: FnMut(&Section) -> bool,
{
    fn should_continue(&mut self, section: &Section) -> bool {
        self(section)
    }
}

/// Continuation that never asks for another instance
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleInstance;

impl Continuation for SingleInstance {
    fn should_continue(&mut self, _section: &Section) -> bool {
        false
    }
}
