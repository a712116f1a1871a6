//! Answer-sheet input surface
//!
//! The form-submission counterpart of the terminal: every answer is known
//! up front, in a JSON sheet.
//!
//! ```json
//! {
//!   "values": {
//!     "Order/Status": "OPEN",
//!     "Order/Entry/Id": ["1", "2"],
//!     "Order/Entry[2]/Note": "second"
//!   },
//!   "repeat": { "Order/Entry": 2 }
//! }
//! ```
//!
//! Keys are instance paths; an indexed key wins over the plain schema
//! path. Arrays are consumed in order, scalars answer every instance.
//! A sheet has no second chance, so the surface closes on the first
//! missing or rejected answer.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Rejection, Result};
use crate::generator::resolver::{Continuation, LeafField, Section, ValueResolver};

/// Answers for one generation run
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnswerSheet {
    /// Leaf values keyed by path
    pub values: IndexMap<String, Value>,
    /// Instance counts keyed by section path (default 1)
    pub repeat: IndexMap<String, usize>,
}

/// Input surface backed by an [`AnswerSheet`]
#[derive(Debug, Clone)]
pub struct BatchSurface {
    sheet: AnswerSheet,
    cursors: HashMap<String, usize>,
    closed: bool,
}

impl BatchSurface {
    /// Create a surface over a sheet
    pub fn from_sheet(sheet: AnswerSheet) -> Self {
        Self {
            sheet,
            cursors: HashMap::new(),
            closed: false,
        }
    }

    /// Parse a sheet from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let sheet: AnswerSheet = serde_json::from_str(json)?;
        Ok(Self::from_sheet(sheet))
    }

    /// Load a sheet file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&text).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// The sheet being answered from
    pub fn sheet(&self) -> &AnswerSheet {
        &self.sheet
    }

    fn lookup(&mut self, field: &LeafField) -> Option<String> {
        let schema_path = field.schema_path();
        let key = if self.sheet.values.contains_key(&field.path) {
            field.path.clone()
        } else {
            schema_path
        };

        match self.sheet.values.get(&key)? {
            Value::Array(items) => {
                let cursor = self.cursors.entry(key.clone()).or_insert(0);
                let item = items.get(*cursor)?;
                *cursor += 1;
                scalar(item)
            }
            other => scalar(other),
        }
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

impl ValueResolver for BatchSurface {
    fn resolve(&mut self, field: &LeafField) -> Option<String> {
        if self.closed {
            return None;
        }
        let answer = self.lookup(field);
        if answer.is_none() {
            debug!(path = %field.path, "no answer in sheet");
            self.closed = true;
        }
        answer
    }

    fn rejected(&mut self, field: &LeafField, rejection: &Rejection) {
        warn!(path = %field.path, %rejection, "answer sheet value rejected");
        self.closed = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Continuation for BatchSurface {
    fn should_continue(&mut self, section: &Section) -> bool {
        let wanted = self
            .sheet
            .repeat
            .get(&section.path)
            .or_else(|| self.sheet.repeat.get(&section.schema_path()))
            .copied()
            .unwrap_or(1);
        section.count < wanted
    }
}
