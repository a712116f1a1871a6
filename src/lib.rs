//! # xsdform
//!
//! Builds the mandatory skeleton of an XML document from an XSD schema,
//! asking an input surface for every required value, then validates the
//! serialized bytes against the same schema.
//!
//! ## Features
//!
//! - XSD 1.0 structures: sequence/choice/all, groups, extension and
//!   restriction, simple content, list and union types, facets
//! - xs:include and xs:import, chameleon includes
//! - Mandatory-only traversal with retry on rejected values
//! - Terminal prompts or a JSON answer sheet as input
//! - Round-trip validation with every diagnostic reported
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use xsdform::generator::{BatchSurface, Generator};
//! use xsdform::{GeneratorConfig, SchemaModel};
//!
//! let model = SchemaModel::from_file("orders.xsd")?;
//! let mut generator = Generator::new(Arc::new(model), GeneratorConfig::default());
//! let mut answers = BatchSurface::from_file("answers.json")?;
//!
//! let outcome = generator.generate("Order", &mut answers)?;
//! outcome.write_to("order.xml")?;
//! if !outcome.is_valid() {
//!     println!("{}", outcome.validation);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// Names and locations
pub mod names;
pub mod namespaces;
pub mod locations;

// Resource loading
pub mod loaders;
pub mod documents;

// Run configuration
pub mod config;

// Schema model and validation
pub mod validators;

// Document generation
pub mod generator;

// Re-exports for convenience
pub use config::{GeneratorConfig, RetryPolicy};
pub use error::{Error, Result};
pub use generator::{GenerationOutcome, Generator};
pub use limits::Limits;
pub use locations::Location;
pub use namespaces::{PrefixMap, QName};
pub use validators::{SchemaModel, ValidationResult};

/// Version of the xsdform library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XSD 1.0 namespace
pub const XSD_NAMESPACE: &str = validators::XSD_NAMESPACE;

/// XML namespace
pub const XML_NAMESPACE: &str = namespaces::XML_NAMESPACE;

/// XML Schema instance namespace
pub const XSI_NAMESPACE: &str = namespaces::XSI_NAMESPACE;
