//! Terminal input surface
//!
//! Prompts on a writer and reads one line per answer. End of input, or a
//! read error, closes the surface; the collector then aborts the run
//! instead of asking again.

use std::io::{BufRead, Write};

use tracing::debug;

use crate::error::Rejection;
use crate::generator::resolver::{Continuation, LeafField, Section, ValueResolver};

/// Line-oriented prompts over any reader and writer
#[derive(Debug)]
pub struct InteractiveSurface<R, W> {
    input: R,
    output: W,
    closed: bool,
}

impl<R: BufRead, W: Write> InteractiveSurface<R, W> {
    /// Create a surface reading answers from `input` and prompting on `output`
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            closed: false,
        }
    }

    /// Give back the reader and writer
    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    fn say(&mut self, text: &str) {
        // A broken prompt channel shows up as end of input on the next read
        let _ = self.output.write_all(text.as_bytes());
        let _ = self.output.flush();
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => {
                debug!("end of interactive input");
                self.closed = true;
                None
            }
            Ok(_) => Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()),
            Err(err) => {
                debug!(error = %err, "interactive input failed");
                self.closed = true;
                None
            }
        }
    }
}

impl<R: BufRead, W: Write> ValueResolver for InteractiveSurface<R, W> {
    fn resolve(&mut self, field: &LeafField) -> Option<String> {
        if self.closed {
            return None;
        }
        if field.is_enumerated() {
            self.say(&format!(
                "Possible values for {}: {}\n",
                field.name.local_name,
                field.enumeration.join(", ")
            ));
        }
        self.say(&format!("{} ({}): ", field.path, field.type_label));
        self.read_line()
    }

    fn rejected(&mut self, _field: &LeafField, rejection: &Rejection) {
        if self.closed {
            return;
        }
        let message = match rejection {
            Rejection::MissingRequiredValue => "Value is required.".to_string(),
            Rejection::ConstraintViolation { .. } => "Invalid value. Please choose from the list.".to_string(),
            Rejection::InvalidLexical { reason, .. } => format!("Invalid value: {}", reason),
        };
        self.say(&format!("{}\n", message));
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<R: BufRead, W: Write> Continuation for InteractiveSurface<R, W> {
    fn should_continue(&mut self, section: &Section) -> bool {
        loop {
            if self.closed {
                return false;
            }
            self.say(&format!("Add another {}? (y/n): ", section.name.local_name));
            let answer = match self.read_line() {
                Some(answer) => answer.trim().to_ascii_lowercase(),
                None => return false,
            };
            match answer.as_str() {
                "y" | "yes" => return true,
                "" | "n" | "no" => return false,
                _ => self.say("Please answer y or n.\n"),
            }
        }
    }
}
