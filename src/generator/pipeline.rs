//! Generation pipeline
//!
//! One run goes `Idle -> RootResolved -> Collecting -> Assembling ->
//! Serialized -> Validated -> Idle`; loading the schema happens once, when
//! the [`Generator`] is built. An invalid document is a completed run:
//! the outcome carries the document and every diagnostic. Any fatal error
//! aborts the run and leaves the schema model as it was.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::locations::Location;
use crate::namespaces::QName;
use crate::validators::document_validation::validate_with_limits;
use crate::validators::parsing::load_schema;
use crate::validators::{SchemaModel, ValidationResult};

use super::assembler::assemble;
use super::collector::Collector;
use super::resolver::InputSurface;
use super::serializer::Serializer;

/// Stage of a generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// No run in progress
    Idle,
    /// Reading and building the schema model
    LoadingSchema,
    /// The root element declaration is known
    RootResolved,
    /// Values are being collected
    Collecting,
    /// The document tree is being built
    Assembling,
    /// The document exists as bytes
    Serialized,
    /// The bytes were checked against the schema
    Validated {
        /// Outcome of the check
        valid: bool,
    },
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Idle => write!(f, "idle"),
            Stage::LoadingSchema => write!(f, "loading schema"),
            Stage::RootResolved => write!(f, "root resolved"),
            Stage::Collecting => write!(f, "collecting"),
            Stage::Assembling => write!(f, "assembling"),
            Stage::Serialized => write!(f, "serialized"),
            Stage::Validated { valid: true } => write!(f, "validated (valid)"),
            Stage::Validated { valid: false } => write!(f, "validated (invalid)"),
        }
    }
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// Root element of the document
    pub root: QName,
    /// Serialized document
    pub document: Vec<u8>,
    /// Round-trip validation result
    pub validation: ValidationResult,
}

impl GenerationOutcome {
    /// Whether the document passed validation
    pub fn is_valid(&self) -> bool {
        self.validation.is_valid()
    }

    /// The document as text
    pub fn as_str(&self) -> Result<&str> {
        std::str::from_utf8(&self.document).map_err(|e| Error::Xml(e.to_string()))
    }

    /// Write the document to a file
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, &self.document)?;
        info!(path = %path.display(), bytes = self.document.len(), "document written");
        Ok(())
    }

    /// Write the document into a sink
    pub fn write_into<W: Write>(&self, mut sink: W) -> Result<()> {
        sink.write_all(&self.document)?;
        sink.flush()?;
        Ok(())
    }
}

/// Generates documents for the global elements of one schema.
///
/// The model is shared: clones of a generator run independently and may
/// be moved to other threads.
#[derive(Debug, Clone)]
pub struct Generator {
    model: Arc<SchemaModel>,
    config: GeneratorConfig,
    stage: Stage,
}

impl Generator {
    /// Create a generator over an already loaded model
    pub fn new(model: Arc<SchemaModel>, config: GeneratorConfig) -> Self {
        Self {
            model,
            config,
            stage: Stage::Idle,
        }
    }

    /// Load the schema at `location` with the configured limits
    pub fn from_location(location: &Location, config: GeneratorConfig) -> Result<Self> {
        debug!(stage = %Stage::LoadingSchema, location = %location.as_str(), "stage transition");
        let model = load_schema(location, &config.limits)?;
        info!(
            location = %location.as_str(),
            documents = model.sources().len(),
            elements = model.global_elements().count(),
            "schema loaded"
        );
        Ok(Self::new(Arc::new(model), config))
    }

    /// The shared schema model
    pub fn model(&self) -> &Arc<SchemaModel> {
        &self.model
    }

    /// The run configuration
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Current stage
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Generate and validate a document for the global element `root`
    pub fn generate(&mut self, root: &str, input: &mut dyn InputSurface) -> Result<GenerationOutcome> {
        let result = self.run(root, input);
        if let Err(err) = &result {
            warn!(stage = %self.stage, error = %err, "generation aborted");
        }
        self.enter(Stage::Idle);
        result
    }

    fn run(&mut self, root: &str, input: &mut dyn InputSurface) -> Result<GenerationOutcome> {
        let element = self.model.resolve_root_element(root)?.clone();
        if element.is_abstract {
            return Err(Error::StructureMismatch {
                path: element.name.local_name.clone(),
                message: format!("root element '{}' is abstract", element.name),
            });
        }
        self.enter(Stage::RootResolved);
        info!(root = %element.name, "generation started");

        self.enter(Stage::Collecting);
        let values = Collector::new(&self.model, &self.config, input).collect_element(&element)?;

        self.enter(Stage::Assembling);
        let tree = assemble(&element.name, &values)?;

        let serializer = Serializer::new(self.config.namespaces.clone())
            .with_schema_bindings(self.model.prefix_bindings())
            .with_indent(self.config.indent);
        let document = serializer.serialize(&tree)?;
        self.enter(Stage::Serialized);

        let validation = validate_with_limits(&document, &self.model, &self.config.limits)?;
        self.enter(Stage::Validated {
            valid: validation.is_valid(),
        });
        match &validation {
            ValidationResult::Valid => info!(root = %element.name, leaves = values.leaf_count(), "document is valid"),
            ValidationResult::Invalid(diagnostics) => {
                warn!(root = %element.name, diagnostics = diagnostics.len(), "document is invalid")
            }
        }

        Ok(GenerationOutcome {
            root: element.name,
            document,
            validation,
        })
    }

    fn enter(&mut self, stage: Stage) {
        debug!(from = %self.stage, to = %stage, "stage transition");
        self.stage = stage;
    }
}

/// The root to generate when none was named: the only global element.
///
/// Fails when the schema declares none, or several.
pub fn default_root(model: &SchemaModel) -> Result<String> {
    let mut elements = model.global_elements().filter(|e| !e.is_abstract);
    match (elements.next(), elements.next()) {
        (Some(only), None) => Ok(only.name.to_string()),
        (None, _) => Err(Error::Config("the schema declares no global element".to_string())),
        (Some(first), Some(second)) => {
            let mut names = vec![first.name.to_string(), second.name.to_string()];
            names.extend(elements.map(|e| e.name.to_string()));
            Err(Error::Config(format!(
                "the schema declares several global elements, choose one with --root: {}",
                names.join(", ")
            )))
        }
    }
}
