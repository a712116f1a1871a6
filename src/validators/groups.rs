//! XSD Model Groups
//!
//! This module implements model groups for XSD content models:
//! - xs:sequence - ordered content
//! - xs:choice - alternative content
//! - xs:all - unordered content
//!
//! Named groups (`xs:group ref`) are inlined when the schema is loaded.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#Model_Groups

use super::elements::ParticleDescriptor;
use super::particles::Occurs;
use super::wildcards::WildcardDescriptor;

/// Model group compositor type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelType {
    /// Ordered sequence of particles
    #[default]
    Sequence,
    /// One of multiple alternatives
    Choice,
    /// Unordered set of particles
    All,
}

impl ModelType {
    /// Parse from the local name of the compositor element
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "sequence" => Some(Self::Sequence),
            "choice" => Some(Self::Choice),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequence => write!(f, "sequence"),
            Self::Choice => write!(f, "choice"),
            Self::All => write!(f, "all"),
        }
    }
}

/// An item of a model group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelItem {
    /// Element particle
    Element(ParticleDescriptor),
    /// Nested model group
    Group(ContentModel),
    /// Wildcard (xs:any)
    Any(WildcardDescriptor),
}

impl ModelItem {
    /// Occurrence bounds of the item
    pub fn occurs(&self) -> Occurs {
        match self {
            Self::Element(p) => p.occurs,
            Self::Group(g) => g.occurs,
            Self::Any(w) => w.occurs,
        }
    }
}

/// A model group with its items in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentModel {
    /// Compositor
    pub kind: ModelType,
    /// Occurrence bounds of the group itself
    pub occurs: Occurs,
    /// Items, in schema declaration order
    pub items: Vec<ModelItem>,
}

impl ContentModel {
    /// Create an empty group
    pub fn new(kind: ModelType, occurs: Occurs) -> Self {
        Self {
            kind,
            occurs,
            items: Vec::new(),
        }
    }

    /// The empty content model
    pub fn empty() -> Self {
        Self::new(ModelType::Sequence, Occurs::once())
    }

    /// Whether the model has no items at all
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Element particles in declaration order, nested groups flattened.
    ///
    /// Bounds are folded through the enclosing groups with
    /// [`Occurs::within`], so a particle inside an optional group comes
    /// out optional. Wildcards are not element particles and are skipped.
    pub fn particles(&self) -> Vec<ParticleDescriptor> {
        let mut out = Vec::new();
        self.collect_particles(Occurs::once(), &mut out);
        out
    }

    fn collect_particles(&self, outer: Occurs, out: &mut Vec<ParticleDescriptor>) {
        let group = self.occurs.within(outer);
        for item in &self.items {
            match item {
                ModelItem::Element(particle) => {
                    out.push(particle.with_occurs(particle.occurs.within(group)));
                }
                ModelItem::Group(nested) => nested.collect_particles(group, out),
                ModelItem::Any(_) => {}
            }
        }
    }

    /// Find the first element particle with the given name, at any depth
    pub fn find_particle(&self, name: &crate::namespaces::QName) -> Option<&ParticleDescriptor> {
        self.items.iter().find_map(|item| match item {
            ModelItem::Element(p) if &p.name == name => Some(p),
            ModelItem::Group(g) => g.find_particle(name),
            _ => None,
        })
    }

    /// Whether the group can match empty content
    pub fn is_emptiable(&self) -> bool {
        if self.occurs.min == 0 || self.items.is_empty() {
            return true;
        }
        let item_emptiable = |item: &ModelItem| match item {
            ModelItem::Group(g) => g.is_emptiable(),
            other => other.occurs().min == 0,
        };
        match self.kind {
            ModelType::Choice => self.items.iter().any(item_emptiable),
            ModelType::Sequence | ModelType::All => self.items.iter().all(item_emptiable),
        }
    }

    /// Append the items of another group (complexContent extension)
    pub fn extended_with(base: &ContentModel, derived: ContentModel) -> ContentModel {
        if base.is_empty() {
            return derived;
        }
        if derived.is_empty() {
            return base.clone();
        }
        ContentModel {
            kind: ModelType::Sequence,
            occurs: Occurs::once(),
            items: vec![ModelItem::Group(base.clone()), ModelItem::Group(derived)],
        }
    }
}
