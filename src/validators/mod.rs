//! XML Schema validators
//!
//! This module contains the schema model and instance validation.

// Foundation modules
pub mod helpers;
pub mod particles;

// Type system
pub mod attributes;
pub mod builtins;
pub mod facets;
pub mod simple_types;

// Complex structures
pub mod complex_types;
pub mod elements;
pub mod groups;
pub mod wildcards;

// Schema loading and the model
pub mod parsing;
pub mod schemas;

// Instance validation
pub mod document_validation;
pub mod validation;

// Re-exports
pub use attributes::{AttributeDescriptor, AttributeUse};
pub use builtins::{Builtin, XSD_NAMESPACE};
pub use complex_types::{ComplexContent, ComplexTypeDescriptor, DerivationMethod};
pub use elements::{ElementDescriptor, ParticleDescriptor, ValueConstraint};
pub use facets::{FacetSet, WhiteSpace};
pub use groups::{ContentModel, ModelItem, ModelType};
pub use particles::Occurs;
pub use schemas::{SchemaModel, TypeDescriptor, TypeId};
pub use simple_types::{SimpleTypeDescriptor, Variety};
pub use validation::{Diagnostic, ValidationResult};
