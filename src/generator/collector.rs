//! Recursive structure collector
//!
//! Walks a type's content model in declaration order and asks the input
//! surface for every mandatory leaf. Particles with `minOccurs = 0` are
//! never visited. Repeatable particles go through
//! [`collect_repeating`](super::repetition::collect_repeating).
//!
//! Rejected values are retried here, at the point of occurrence; only an
//! exhausted retry policy, a closed input or runaway recursion escapes as
//! a [`CollectionError`].

use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use crate::config::GeneratorConfig;
use crate::error::{CollectionError, CollectionFailure, Error, Rejection, Result};
use crate::namespaces::QName;
use crate::validators::{
    ComplexContent, ElementDescriptor, ParticleDescriptor, SchemaModel, TypeDescriptor, TypeId, XSD_NAMESPACE,
};

use super::repetition::collect_repeating;
use super::resolver::{InputSurface, LeafField, Section};
use super::values::ValueNode;

/// Collects the mandatory values of one document
pub struct Collector<'a> {
    model: &'a SchemaModel,
    config: &'a GeneratorConfig,
    input: &'a mut dyn InputSurface,
    depth: usize,
}

impl<'a> Collector<'a> {
    /// Create a collector over a schema model and an input surface
    pub fn new(model: &'a SchemaModel, config: &'a GeneratorConfig, input: &'a mut dyn InputSurface) -> Self {
        Self {
            model,
            config,
            input,
            depth: 0,
        }
    }

    /// The configuration of this run
    pub fn config(&self) -> &GeneratorConfig {
        self.config
    }

    /// Collect the values of a global element
    pub fn collect_element(&mut self, element: &ElementDescriptor) -> Result<ValueNode> {
        let path = element.name.local_name.clone();
        match element.value_constraint.as_ref().and_then(|v| v.fixed()) {
            Some(fixed) => Ok(ValueNode::leaf(fixed)),
            None => self.collect(element.type_id, &element.name, &path),
        }
    }

    /// Collect the values for a type at `path`
    pub fn collect(&mut self, type_id: TypeId, name: &QName, path: &str) -> Result<ValueNode> {
        self.depth += 1;
        let result = self.collect_inner(type_id, name, path);
        self.depth -= 1;
        result
    }

    fn collect_inner(&mut self, type_id: TypeId, name: &QName, path: &str) -> Result<ValueNode> {
        if !self.config.limits.allows_collection_depth(self.depth) {
            return Err(CollectionError::new(path, CollectionFailure::DepthExceeded { depth: self.depth }).into());
        }

        let complex = match self.model.type_of(type_id) {
            TypeDescriptor::Simple(_) => return self.collect_leaf(type_id, type_id, name, path),
            TypeDescriptor::Complex(complex) => complex,
        };
        let content = match &complex.content {
            ComplexContent::Simple(text_type) => return self.collect_leaf(*text_type, type_id, name, path),
            ComplexContent::Elements(content) => content,
        };

        let particles = self.model.particles_of(content);
        let mandatory: Vec<&ParticleDescriptor> = particles.iter().filter(|p| p.occurs.is_mandatory()).collect();
        check_unique_names(&mandatory, path)?;

        let mut children = IndexMap::with_capacity(mandatory.len());
        for particle in &particles {
            if !particle.occurs.is_mandatory() {
                trace!(path, particle = %particle, "skipping optional particle");
                continue;
            }
            let child_path = format!("{}/{}", path, particle.name.local_name);
            let value = if particle.occurs.is_repeatable() {
                debug!(path = %child_path, occurs = %particle.occurs, "collecting repeatable section");
                ValueNode::Repeated(collect_repeating(self, particle, &child_path)?)
            } else {
                self.collect_particle(particle, &child_path)?
            };
            children.insert(particle.name.clone(), value);
        }
        Ok(ValueNode::Composite(children))
    }

    /// Collect one instance of a particle
    pub fn collect_particle(&mut self, particle: &ParticleDescriptor, path: &str) -> Result<ValueNode> {
        match particle.fixed() {
            Some(fixed) => {
                debug!(path, fixed, "using fixed value");
                Ok(ValueNode::leaf(fixed))
            }
            None => self.collect(particle.type_id, &particle.name, path),
        }
    }

    /// Ask the continuation whether a section gets another instance
    pub fn should_continue(&mut self, section: &Section) -> bool {
        if self.input.is_closed() {
            return false;
        }
        self.input.should_continue(section)
    }

    /// Ask for a leaf value until it is accepted.
    ///
    /// `text_type` is the simple type checked; `declared` is the element's
    /// own type, whose label the input surface shows.
    fn collect_leaf(&mut self, text_type: TypeId, declared: TypeId, name: &QName, path: &str) -> Result<ValueNode> {
        let enumeration = self.model.enumeration_of(text_type).to_vec();
        let type_label = type_label(self.model, declared);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let field = LeafField {
                path: path.to_string(),
                name: name.clone(),
                enumeration: enumeration.clone(),
                required: true,
                attempt,
                type_label: type_label.clone(),
            };

            let answer = self.input.resolve(&field);
            // A blank answer is absent unless the enumeration lists the empty string
            let rejection = match answer.as_deref().map(str::trim) {
                None => Rejection::MissingRequiredValue,
                Some("") if !enumeration.iter().any(String::is_empty) => Rejection::MissingRequiredValue,
                Some(value) if field.is_enumerated() && !enumeration.iter().any(|e| e == value) => {
                    Rejection::ConstraintViolation {
                        value: value.to_string(),
                        allowed: enumeration.clone(),
                    }
                }
                Some(value) => match self.lexical_check(text_type, value) {
                    Ok(()) => {
                        debug!(path, attempt, "leaf value accepted");
                        return Ok(ValueNode::leaf(value));
                    }
                    Err(reason) => Rejection::InvalidLexical {
                        value: value.to_string(),
                        reason,
                    },
                },
            };

            warn!(path, attempt, %rejection, "leaf value rejected");
            self.input.rejected(&field, &rejection);

            if self.input.is_closed() {
                return Err(CollectionError::new(path, CollectionFailure::InputClosed).into());
            }
            if !self.config.retry.allows_retry_after(attempt) {
                return Err(CollectionError::new(
                    path,
                    CollectionFailure::RetriesExhausted {
                        attempts: attempt,
                        last: rejection,
                    },
                )
                .into());
            }
        }
    }

    fn lexical_check(&self, text_type: TypeId, value: &str) -> std::result::Result<(), String> {
        if self.config.check_lexical {
            self.model.validate_simple(text_type, value)
        } else {
            Ok(())
        }
    }
}

/// Label of a type as shown to the input surface (`xs:int`, `Status`)
pub fn type_label(model: &SchemaModel, id: TypeId) -> String {
    let ty = model.type_of(id);
    let name = match ty.name() {
        Some(name) => Some(name),
        // Anonymous types are labelled by the nearest named base
        None => model
            .leaf_type_of(id)
            .and_then(|leaf| model.simple_chain(leaf).find_map(|step| step.name.as_ref())),
    };
    match name {
        Some(name) if name.namespace() == Some(XSD_NAMESPACE) => format!("xs:{}", name.local_name),
        Some(name) => name.local_name.clone(),
        None => ty.label(),
    }
}

/// Mandatory particles key the composite, so one name may appear once
fn check_unique_names(mandatory: &[&ParticleDescriptor], path: &str) -> Result<()> {
    for (index, particle) in mandatory.iter().enumerate() {
        if mandatory[..index].iter().any(|earlier| earlier.name == particle.name) {
            return Err(Error::StructureMismatch {
                path: path.to_string(),
                message: format!(
                    "mandatory element '{}' is declared more than once in the content model",
                    particle.name
                ),
            });
        }
    }
    Ok(())
}
