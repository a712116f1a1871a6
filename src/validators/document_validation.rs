//! Document Validation
//!
//! This module validates a serialized XML byte stream against a
//! [`SchemaModel`]. Every defect is collected: missing and unexpected
//! children, ordering defects, leaf value defects, attribute defects and
//! misuse of `xsi:nil`.
//!
//! Content models are matched exactly by computing the set of child
//! positions each particle can end at. When that fails, a greedy walk over
//! the model explains the failure in terms of concrete elements. A child
//! the walk cannot place is reported and dropped, and the walk restarts,
//! so one stray element does not turn its later siblings into defects.

use std::collections::BTreeSet;
use std::fmt;

use tracing::debug;

use crate::documents::{Document, Element};
use crate::error::Result;
use crate::limits::Limits;
use crate::namespaces::{QName, XSI_NAMESPACE};

use super::complex_types::{ComplexContent, ComplexTypeDescriptor};
use super::elements::{ElementDescriptor, ParticleDescriptor, ValueConstraint};
use super::groups::{ContentModel, ModelItem, ModelType};
use super::particles::Occurs;
use super::schemas::{SchemaModel, TypeDescriptor, TypeId};
use super::validation::{Diagnostic, ValidationContext, ValidationResult};
use super::wildcards::{ProcessContents, WildcardDescriptor};
use super::XSD_NAMESPACE;

/// Validate an XML document against the schema
pub fn validate(xml: &[u8], model: &SchemaModel) -> Result<ValidationResult> {
    validate_with_limits(xml, model, &Limits::default())
}

/// Validate an XML document with explicit resource limits
pub fn validate_with_limits(xml: &[u8], model: &SchemaModel, limits: &Limits) -> Result<ValidationResult> {
    limits.check_xml_size(xml.len())?;

    let document = match Document::parse(xml) {
        Ok(document) => document,
        Err(err) => {
            debug!(error = %err, "document is not well-formed");
            return Ok(ValidationResult::Invalid(vec![Diagnostic::new(
                "/",
                format!("document is not well-formed: {}", err),
            )]));
        }
    };
    let root = match document.root() {
        Some(root) => root,
        None => {
            return Ok(ValidationResult::Invalid(vec![Diagnostic::new(
                "/",
                "document has no root element",
            )]))
        }
    };

    let mut context = ValidationContext::new(limits.max_xml_depth);
    context.enter_level(root.local_name(), root.line);
    match model.lookup_element(&root.qname) {
        Some(decl) => {
            Validator { model }.validate_element(root, ElementCheck::global(decl), &mut context);
        }
        None => context.add_error(format!(
            "no global element declaration for '{}'",
            display_name(&root.qname)
        )),
    }
    context.exit_level();

    let result = context.finish();
    debug!(valid = result.is_valid(), diagnostics = result.diagnostics().len(), "document validated");
    Ok(result)
}

/// Name as written in diagnostics: local name, or Clark notation when namespaced
fn display_name(name: &QName) -> String {
    match name.namespace() {
        Some(_) => name.to_string(),
        None => name.local_name.clone(),
    }
}

fn is_true(value: &str) -> bool {
    matches!(value.trim(), "true" | "1")
}

/// What an element occurrence is checked against
#[derive(Clone, Copy)]
struct ElementCheck<'m> {
    type_id: TypeId,
    nillable: bool,
    value_constraint: Option<&'m ValueConstraint>,
    is_abstract: bool,
}

impl<'m> ElementCheck<'m> {
    fn global(decl: &'m ElementDescriptor) -> Self {
        Self {
            type_id: decl.type_id,
            nillable: decl.nillable,
            value_constraint: decl.value_constraint.as_ref(),
            is_abstract: decl.is_abstract,
        }
    }

    fn local(particle: &'m ParticleDescriptor) -> Self {
        Self {
            type_id: particle.type_id,
            nillable: particle.nillable,
            value_constraint: particle.value_constraint.as_ref(),
            is_abstract: particle.is_abstract,
        }
    }
}

struct Validator<'m> {
    model: &'m SchemaModel,
}

impl<'m> Validator<'m> {
    fn validate_element(&self, elem: &Element, check: ElementCheck<'m>, ctx: &mut ValidationContext) {
        if ctx.is_max_depth_exceeded() {
            ctx.add_error("maximum validation depth exceeded");
            return;
        }
        if check.is_abstract {
            ctx.add_error(format!("element '{}' is abstract", display_name(&elem.qname)));
        }
        let type_id = self.instance_type(elem, check.type_id, ctx);

        let nilled = elem
            .get_attribute_qname(&QName::namespaced(XSI_NAMESPACE, "nil"))
            .is_some_and(is_true);
        if nilled {
            if !check.nillable {
                ctx.add_error("element is not nillable but has xsi:nil=\"true\"");
            } else if !elem.children.is_empty() || elem.has_significant_text() {
                ctx.add_error("nilled element must be empty");
            }
        }

        match self.model.type_of(type_id) {
            TypeDescriptor::Simple(_) => {
                if let Some((name, _)) = elem
                    .attributes
                    .iter()
                    .find(|(name, _)| name.namespace() != Some(XSI_NAMESPACE))
                {
                    ctx.add_error(format!("attribute '{}' is not allowed on a simple-typed element", display_name(name)));
                }
                if !elem.children.is_empty() {
                    ctx.add_error("element of simple type must not have child elements");
                } else if !nilled {
                    self.check_text(elem, type_id, check.value_constraint, ctx);
                }
            }
            TypeDescriptor::Complex(complex) => {
                self.check_attributes(elem, complex, ctx);
                if nilled {
                    return;
                }
                match &complex.content {
                    ComplexContent::Simple(text_type) => {
                        if !elem.children.is_empty() {
                            ctx.add_error("element with simple content must not have child elements");
                        } else {
                            self.check_text(elem, *text_type, check.value_constraint, ctx);
                        }
                    }
                    ComplexContent::Elements(content) => {
                        if !complex.mixed && elem.has_significant_text() {
                            ctx.add_error("character data is not allowed in element-only content");
                        }
                        self.check_children(elem, content, ctx);
                    }
                }
            }
        }
    }

    /// Type governing an element: the declared one, or the `xsi:type`
    /// override when that names a type derived from it
    fn instance_type(&self, elem: &Element, declared: TypeId, ctx: &mut ValidationContext) -> TypeId {
        let Some(name) = &elem.xsi_type else {
            if let Some(complex) = self.model.type_of(declared).as_complex().filter(|c| c.is_abstract) {
                ctx.add_error(format!(
                    "element '{}' has abstract type '{}'",
                    display_name(&elem.qname),
                    complex.label()
                ));
            }
            return declared;
        };
        match self.model.lookup_type(name) {
            Some(id) if self.model.is_derived_from(id, declared) => {
                if self.model.type_of(id).as_complex().is_some_and(|c| c.is_abstract) {
                    ctx.add_error(format!("xsi:type '{}' is abstract", display_name(name)));
                }
                id
            }
            Some(_) => {
                ctx.add_error(format!(
                    "xsi:type '{}' is not derived from the declared type '{}'",
                    display_name(name),
                    self.model.type_of(declared).label()
                ));
                declared
            }
            // Built-ins the schema never uses have no descriptor
            None if Some(declared) == self.model.any_type && name.namespace() == Some(XSD_NAMESPACE) => declared,
            None => {
                ctx.add_error(format!("xsi:type '{}' does not name a type of the schema", display_name(name)));
                declared
            }
        }
    }

    fn check_text(
        &self,
        elem: &Element,
        type_id: TypeId,
        value_constraint: Option<&ValueConstraint>,
        ctx: &mut ValidationContext,
    ) {
        let text = elem.text_content();
        if let Err(reason) = self.model.validate_simple(type_id, text) {
            ctx.add_error(format!("invalid value '{}': {}", text.trim(), reason));
            return;
        }
        if let Some(fixed) = value_constraint.and_then(ValueConstraint::fixed) {
            let ws = self.model.white_space_of(type_id);
            if ws.normalize(text) != ws.normalize(fixed) {
                ctx.add_error(format!("value '{}' differs from the fixed value '{}'", text.trim(), fixed));
            }
        }
    }

    fn check_attributes(&self, elem: &Element, complex: &ComplexTypeDescriptor, ctx: &mut ValidationContext) {
        for (name, value) in &elem.attributes {
            if name.namespace() == Some(XSI_NAMESPACE) {
                continue;
            }
            match complex.attribute(name) {
                Some(decl) if decl.is_prohibited() => {
                    ctx.add_error(format!("attribute '{}' is prohibited", display_name(name)));
                }
                Some(decl) => {
                    if let Err(reason) = self.model.validate_simple(decl.type_id, value) {
                        ctx.add_error(format!(
                            "invalid value '{}' for attribute '{}': {}",
                            value,
                            display_name(name),
                            reason
                        ));
                    } else if let Some(fixed) = decl.fixed() {
                        let ws = self.model.white_space_of(decl.type_id);
                        if ws.normalize(value) != ws.normalize(fixed) {
                            ctx.add_error(format!(
                                "attribute '{}' must have the fixed value '{}'",
                                display_name(name),
                                fixed
                            ));
                        }
                    }
                }
                None => {
                    let allowed = complex
                        .any_attribute
                        .as_ref()
                        .is_some_and(|wildcard| wildcard.namespaces.allows(name.namespace()));
                    if !allowed {
                        ctx.add_error(format!("attribute '{}' is not declared", display_name(name)));
                    }
                }
            }
        }

        for decl in complex.attributes.iter().filter(|a| a.is_required()) {
            if elem.get_attribute_qname(&decl.name).is_none() {
                ctx.add_error(format!("missing required attribute '{}'", display_name(&decl.name)));
            }
        }
    }

    fn check_children(&self, elem: &Element, content: &'m ContentModel, ctx: &mut ValidationContext) {
        let children: Vec<&Element> = elem.children.iter().collect();
        let matcher = Matcher {
            model: self.model,
            children: &children,
        };

        if !matcher.group(content, 0).contains(&children.len()) {
            let problems = self.explain(content, &children);
            if problems.is_empty() {
                ctx.add_error(format!("content does not match the {} content model", content.kind));
            }
            for problem in problems {
                ctx.add_error(problem.to_string());
            }
        }

        for (index, child) in children.iter().enumerate() {
            let Some(check) = self.declaration_for(child, content, ctx) else {
                continue;
            };
            let same_name = children.iter().filter(|c| c.qname == child.qname).count();
            let segment = if same_name > 1 {
                let position = children[..=index].iter().filter(|c| c.qname == child.qname).count();
                format!("{}[{}]", child.local_name(), position)
            } else {
                child.local_name().to_string()
            };

            ctx.enter_level(segment, child.line);
            self.validate_element(child, check, ctx);
            ctx.exit_level();
        }
    }

    /// Defects of children that failed to match, in terms of elements.
    ///
    /// Children the walk cannot place are dropped one at a time until the
    /// rest explains cleanly; a dropped child that was also reported
    /// missing is out of order.
    fn explain(&self, content: &'m ContentModel, children: &[&Element]) -> Vec<Problem> {
        let mut remaining: Vec<&Element> = children.to_vec();
        let mut dropped: Vec<&Element> = Vec::new();
        let mut problems = Vec::new();

        loop {
            let matcher = Matcher {
                model: self.model,
                children: &remaining,
            };
            if matcher.group(content, 0).contains(&remaining.len()) {
                break;
            }
            let end = matcher.explain_group(content, 0, false, &mut Vec::new());
            if end >= remaining.len() {
                matcher.explain_group(content, 0, true, &mut problems);
                break;
            }
            dropped.push(remaining.remove(end));
        }

        for child in dropped {
            let described = format!("'{}'", display_name(&child.qname));
            let missing = problems
                .iter()
                .position(|p| matches!(p, Problem::Missing(item) if *item == described));
            match missing {
                Some(index) => problems[index] = Problem::OutOfOrder(child.qname.clone()),
                None => problems.push(Problem::Unexpected {
                    name: child.qname.clone(),
                    known: self.particle_for(&child.qname, content).is_some(),
                }),
            }
        }
        problems
    }

    /// Particle a child occupies: one with its own name, or the head of a
    /// substitution group it belongs to
    fn particle_for(&self, name: &QName, content: &'m ContentModel) -> Option<&'m ParticleDescriptor> {
        content
            .find_particle(name)
            .or_else(|| find_head(content, self.model, name))
    }

    /// Declaration governing a child: its particle, a substitution group
    /// member, or a global element reached through a wildcard
    fn declaration_for(
        &self,
        child: &Element,
        content: &'m ContentModel,
        ctx: &mut ValidationContext,
    ) -> Option<ElementCheck<'m>> {
        if let Some(particle) = content.find_particle(&child.qname) {
            return Some(ElementCheck::local(particle));
        }
        if find_head(content, self.model, &child.qname).is_some() {
            return self.model.lookup_element(&child.qname).map(ElementCheck::global);
        }

        let wildcard = find_wildcard(content, child.namespace())?;
        if wildcard.process_contents == ProcessContents::Skip {
            return None;
        }
        match self.model.lookup_element(&child.qname) {
            Some(global) => Some(ElementCheck::global(global)),
            None => {
                if wildcard.process_contents == ProcessContents::Strict {
                    ctx.add_error(format!(
                        "no global declaration for element '{}' matched by a strict wildcard",
                        display_name(&child.qname)
                    ));
                }
                None
            }
        }
    }
}

fn find_head<'c>(content: &'c ContentModel, model: &SchemaModel, member: &QName) -> Option<&'c ParticleDescriptor> {
    content.items.iter().find_map(|item| match item {
        ModelItem::Element(particle) if model.substitutes_for(member, &particle.name) => Some(particle),
        ModelItem::Group(group) => find_head(group, model, member),
        _ => None,
    })
}

fn find_wildcard<'c>(content: &'c ContentModel, namespace: Option<&str>) -> Option<&'c WildcardDescriptor> {
    content.items.iter().find_map(|item| match item {
        ModelItem::Any(wildcard) if wildcard.namespaces.allows(namespace) => Some(wildcard),
        ModelItem::Group(group) => find_wildcard(group, namespace),
        _ => None,
    })
}

/// Content model matcher over the children of one element
struct Matcher<'e> {
    model: &'e SchemaModel,
    children: &'e [&'e Element],
}

impl<'e> Matcher<'e> {
    fn matches_item(&self, item: &ModelItem, position: usize) -> bool {
        let Some(child) = self.children.get(position) else {
            return false;
        };
        match item {
            ModelItem::Element(particle) => {
                particle.name == child.qname || self.model.substitutes_for(&child.qname, &particle.name)
            }
            ModelItem::Any(wildcard) => wildcard.namespaces.allows(child.namespace()),
            ModelItem::Group(_) => false,
        }
    }

    /// End positions reachable by matching `item` from `start`
    fn item(&self, item: &ModelItem, start: usize) -> BTreeSet<usize> {
        match item {
            ModelItem::Group(group) => self.group(group, start),
            single => self.repeat(single.occurs(), start, |position| {
                if self.matches_item(single, position) {
                    BTreeSet::from([position + 1])
                } else {
                    BTreeSet::new()
                }
            }),
        }
    }

    /// End positions of a group, its own occurrence bounds included
    fn group(&self, group: &ContentModel, start: usize) -> BTreeSet<usize> {
        self.repeat(group.occurs, start, |position| self.body(group, position))
    }

    /// End positions of one instance of a group
    fn body(&self, group: &ContentModel, start: usize) -> BTreeSet<usize> {
        match group.kind {
            ModelType::Sequence => {
                let mut positions = BTreeSet::from([start]);
                for item in &group.items {
                    positions = positions.iter().flat_map(|p| self.item(item, *p)).collect();
                    if positions.is_empty() {
                        break;
                    }
                }
                positions
            }
            ModelType::Choice => {
                if group.items.is_empty() {
                    return BTreeSet::from([start]);
                }
                group.items.iter().flat_map(|item| self.item(item, start)).collect()
            }
            ModelType::All => {
                let mut ends = BTreeSet::new();
                self.all(group, start, &mut vec![false; group.items.len()], &mut ends);
                ends
            }
        }
    }

    fn all(&self, group: &ContentModel, position: usize, used: &mut Vec<bool>, ends: &mut BTreeSet<usize>) {
        let complete = group
            .items
            .iter()
            .zip(used.iter())
            .all(|(item, used)| *used || item.occurs().min == 0);
        if complete {
            ends.insert(position);
        }
        for index in 0..group.items.len() {
            if used[index] {
                continue;
            }
            for next in self.item(&group.items[index], position) {
                if next > position {
                    used[index] = true;
                    self.all(group, next, used, ends);
                    used[index] = false;
                }
            }
        }
    }

    /// Apply occurrence bounds to a single-instance matcher
    fn repeat(&self, occurs: Occurs, start: usize, once: impl Fn(usize) -> BTreeSet<usize>) -> BTreeSet<usize> {
        let mut results = BTreeSet::new();
        if occurs.min == 0 {
            results.insert(start);
        }
        // Past this many instances only empty matches remain
        let bound = occurs.min as usize + self.children.len().saturating_sub(start) + 1;
        let mut frontier = BTreeSet::from([start]);
        let mut count: u32 = 0;

        while !frontier.is_empty() && !occurs.max.is_some_and(|max| count >= max) && (count as usize) < bound {
            let next: BTreeSet<usize> = frontier.iter().flat_map(|p| once(*p)).collect();
            count += 1;
            if count >= occurs.min {
                results.extend(next.iter().copied());
            }
            if next == frontier && count >= occurs.min {
                break;
            }
            frontier = next;
        }
        results
    }

    // =========================================================================
    // Explanations for content that failed to match
    // =========================================================================

    fn explain_group(&self, group: &ContentModel, mut position: usize, report: bool, out: &mut Vec<Problem>) -> usize {
        let mut count: u32 = 0;
        loop {
            if group.occurs.max.is_some_and(|max| count >= max) {
                break;
            }
            let next = self.explain_body(group, position, false, &mut Vec::new());
            if next == position {
                if report && count < group.occurs.min {
                    self.explain_body(group, position, true, out);
                }
                break;
            }
            position = self.explain_body(group, position, report, out);
            count += 1;
        }
        position
    }

    fn explain_body(&self, group: &ContentModel, mut position: usize, report: bool, out: &mut Vec<Problem>) -> usize {
        match group.kind {
            ModelType::Sequence => {
                for item in &group.items {
                    position = self.explain_item(item, position, report, out);
                }
                position
            }
            ModelType::Choice => {
                for item in &group.items {
                    if self.explain_item(item, position, false, &mut Vec::new()) > position {
                        return self.explain_item(item, position, report, out);
                    }
                }
                if report && !group.items.is_empty() && !group.items.iter().any(|i| i.occurs().min == 0) {
                    out.push(Problem::MissingOneOf(group.items.iter().map(describe_item).collect()));
                }
                position
            }
            ModelType::All => {
                let mut remaining: Vec<&ModelItem> = group.items.iter().collect();
                while let Some(index) = remaining
                    .iter()
                    .position(|item| self.explain_item(item, position, false, &mut Vec::new()) > position)
                {
                    position = self.explain_item(remaining.remove(index), position, report, out);
                }
                for item in remaining {
                    self.explain_item(item, position, report, out);
                }
                position
            }
        }
    }

    fn explain_item(&self, item: &ModelItem, mut position: usize, report: bool, out: &mut Vec<Problem>) -> usize {
        if let ModelItem::Group(group) = item {
            return self.explain_group(group, position, report, out);
        }
        let occurs = item.occurs();
        let mut count: u32 = 0;
        while !occurs.max.is_some_and(|max| count >= max) && self.matches_item(item, position) {
            position += 1;
            count += 1;
        }
        if report && count < occurs.min {
            out.push(match count {
                0 => Problem::Missing(describe_item(item)),
                n => Problem::TooFew {
                    item: describe_item(item),
                    count: n,
                    min: occurs.min,
                },
            });
        }
        position
    }
}

/// A content model defect
#[derive(Debug, Clone, PartialEq)]
enum Problem {
    /// A mandatory item is absent
    Missing(String),
    /// An item occurs fewer times than required
    TooFew { item: String, count: u32, min: u32 },
    /// No alternative of a mandatory choice is present
    MissingOneOf(Vec<String>),
    /// A child no remaining item accepts
    Unexpected { name: QName, known: bool },
    /// A child that belongs earlier in the content
    OutOfOrder(QName),
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::Missing(item) => write!(f, "missing mandatory element {}", item),
            Problem::TooFew { item, count, min } => {
                write!(f, "{} occurs {} times, at least {} required", item, count, min)
            }
            Problem::MissingOneOf(items) => write!(f, "missing one of: {}", items.join(" | ")),
            Problem::Unexpected { name, known: true } => write!(
                f,
                "unexpected element '{}' (out of order or too many occurrences)",
                display_name(name)
            ),
            Problem::Unexpected { name, known: false } => {
                write!(f, "unexpected element '{}'", display_name(name))
            }
            Problem::OutOfOrder(name) => write!(f, "element '{}' is out of order", display_name(name)),
        }
    }
}

fn describe_item(item: &ModelItem) -> String {
    match item {
        ModelItem::Element(particle) => format!("'{}'", display_name(&particle.name)),
        ModelItem::Any(_) => "(any element)".to_string(),
        ModelItem::Group(group) => {
            let names: Vec<String> = group.items.iter().map(describe_item).collect();
            format!("({})", names.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:simpleType name="Status">
    <xs:restriction base="xs:string">
      <xs:enumeration value="OPEN"/>
      <xs:enumeration value="CLOSED"/>
    </xs:restriction>
  </xs:simpleType>
  <xs:element name="Order">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="Id" type="xs:int"/>
        <xs:element name="Status" type="Status"/>
        <xs:element name="Entry" maxOccurs="unbounded">
          <xs:complexType>
            <xs:sequence><xs:element name="Sku" type="xs:string"/></xs:sequence>
          </xs:complexType>
        </xs:element>
        <xs:element name="Note" type="xs:string" minOccurs="0"/>
      </xs:sequence>
      <xs:attribute name="version" type="xs:string" use="required"/>
      <xs:attribute name="channel" type="xs:string" fixed="web"/>
    </xs:complexType>
  </xs:element>
  <xs:element name="Pick">
    <xs:complexType>
      <xs:choice>
        <xs:element name="A" type="xs:string"/>
        <xs:element name="B" type="xs:string"/>
      </xs:choice>
    </xs:complexType>
  </xs:element>
  <xs:element name="Bag">
    <xs:complexType>
      <xs:all>
        <xs:element name="X" type="xs:string"/>
        <xs:element name="Y" type="xs:string" minOccurs="0"/>
      </xs:all>
    </xs:complexType>
  </xs:element>
  <xs:element name="Open">
    <xs:complexType>
      <xs:sequence>
        <xs:any processContents="skip" minOccurs="0" maxOccurs="unbounded"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
  <xs:element name="Maybe" type="xs:int" nillable="true"/>
</xs:schema>"#;

    fn check(xml: &str) -> ValidationResult {
        let model = SchemaModel::from_string(SCHEMA).unwrap();
        validate(xml.as_bytes(), &model).unwrap()
    }

    fn messages(result: &ValidationResult) -> Vec<String> {
        result.diagnostics().iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn test_valid_order() {
        let result = check(
            r#"<Order version="1"><Id>7</Id><Status>OPEN</Status><Entry><Sku>a</Sku></Entry><Entry><Sku>b</Sku></Entry></Order>"#,
        );
        assert!(result.is_valid(), "{:?}", messages(&result));
    }

    #[test]
    fn test_reports_every_defect() {
        let result = check(r#"<Order><Id>x</Id><Status>PENDING</Status></Order>"#);
        let all = messages(&result).join("\n");
        assert!(all.contains("missing required attribute 'version'"), "{}", all);
        assert!(all.contains("missing mandatory element 'Entry'"), "{}", all);
        assert!(all.contains("/Order/Id"), "{}", all);
        assert!(all.contains("/Order/Status"), "{}", all);
        assert_eq!(result.diagnostics().len(), 4);
    }

    #[test]
    fn test_ordering_defect() {
        let result = check(
            r#"<Order version="1"><Status>OPEN</Status><Id>7</Id><Entry><Sku>a</Sku></Entry></Order>"#,
        );
        let all = messages(&result).join("\n");
        assert!(!result.is_valid());
        assert!(all.contains("out of order"), "{}", all);
    }

    #[test]
    fn test_indexed_paths_for_repeated_siblings() {
        let result = check(
            r#"<Order version="1"><Id>7</Id><Status>OPEN</Status><Entry><Sku>a</Sku></Entry><Entry/></Order>"#,
        );
        assert_eq!(result.diagnostics().len(), 1);
        assert_eq!(result.diagnostics()[0].location, "/Order/Entry[2]");
    }

    #[test]
    fn test_attribute_defects() {
        let result = check(
            r#"<Order version="1" channel="mail" color="red"><Id>7</Id><Status>OPEN</Status><Entry><Sku>a</Sku></Entry></Order>"#,
        );
        let all = messages(&result).join("\n");
        assert!(all.contains("fixed value 'web'"), "{}", all);
        assert!(all.contains("attribute 'color' is not declared"), "{}", all);
    }

    #[test]
    fn test_choice_and_all() {
        assert!(check("<Pick><B>x</B></Pick>").is_valid());
        let both = check("<Pick><A>x</A><B>y</B></Pick>");
        assert!(messages(&both).join("\n").contains("unexpected element 'B'"));
        let none = check("<Pick/>");
        assert!(messages(&none).join("\n").contains("missing one of: 'A' | 'B'"));

        assert!(check("<Bag><Y>1</Y><X>2</X></Bag>").is_valid());
        assert!(check("<Bag><X>2</X></Bag>").is_valid());
        assert!(!check("<Bag><Y>1</Y></Bag>").is_valid());
    }

    #[test]
    fn test_wildcard_skip() {
        assert!(check(r#"<Open><anything xmlns="urn:x"><deep/></anything><more/></Open>"#).is_valid());
    }

    #[test]
    fn test_nil() {
        let xsi = r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#;
        assert!(check(&format!(r#"<Maybe {} xsi:nil="true"/>"#, xsi)).is_valid());
        assert!(!check(&format!(r#"<Maybe {} xsi:nil="true">3</Maybe>"#, xsi)).is_valid());
        let result = check(&format!(r#"<Order {} xsi:nil="true" version="1"/>"#, xsi));
        assert!(messages(&result).join("\n").contains("not nillable"));
    }

    #[test]
    fn test_malformed_document_is_a_diagnostic() {
        let result = check("<Order><Id>");
        assert!(!result.is_valid());
        assert!(result.diagnostics()[0].message.contains("not well-formed"));
    }

    #[test]
    fn test_unknown_root() {
        let result = check("<Unknown/>");
        assert!(result.diagnostics()[0].message.contains("no global element declaration for 'Unknown'"));
    }

    #[test]
    fn test_text_in_element_only_content() {
        let result = check(r#"<Pick>stray<A>x</A></Pick>"#);
        assert!(messages(&result).join("\n").contains("character data is not allowed"));
    }

    #[test]
    fn test_depth_limit() {
        let model = SchemaModel::from_string(SCHEMA).unwrap();
        let limits = Limits { max_xml_depth: 1, ..Limits::default() };
        let xml = r#"<Order version="1"><Id>7</Id><Status>OPEN</Status><Entry><Sku>a</Sku></Entry></Order>"#;
        let result = validate_with_limits(xml.as_bytes(), &model, &limits).unwrap();
        assert!(messages(&result).join("\n").contains("maximum validation depth exceeded"));
    }

    const SUBSTITUTABLE: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="Head" type="xs:string" abstract="true"/>
  <xs:element name="Sub" type="xs:string" substitutionGroup="Head"/>
  <xs:complexType name="AT" abstract="true">
    <xs:sequence><xs:element name="Z" type="xs:string"/></xs:sequence>
  </xs:complexType>
  <xs:complexType name="CT">
    <xs:complexContent>
      <xs:extension base="AT">
        <xs:sequence><xs:element name="W" type="xs:int" minOccurs="0"/></xs:sequence>
      </xs:extension>
    </xs:complexContent>
  </xs:complexType>
  <xs:element name="R">
    <xs:complexType>
      <xs:sequence>
        <xs:element ref="Head"/>
        <xs:element name="T" type="AT"/>
        <xs:element name="P" type="xs:decimal"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
  <xs:element name="S">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="A" type="xs:string"/>
        <xs:element name="B" type="xs:string"/>
        <xs:element name="C" type="xs:int" maxOccurs="unbounded"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
</xs:schema>"#;

    const XSI: &str = r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#;

    fn check_substitutable(xml: &str) -> ValidationResult {
        let model = SchemaModel::from_string(SUBSTITUTABLE).unwrap();
        validate(xml.as_bytes(), &model).unwrap()
    }

    fn located(result: &ValidationResult) -> Vec<(String, String)> {
        result
            .diagnostics()
            .iter()
            .map(|d| (d.location.clone(), d.message.clone()))
            .collect()
    }

    fn pair(location: &str, message: &str) -> (String, String) {
        (location.to_string(), message.to_string())
    }

    #[test]
    fn test_abstract_element_and_type() {
        let result = check_substitutable("<R><Head>x</Head><T><Z>z</Z></T><P>1.00</P></R>");
        assert_eq!(
            located(&result),
            vec![
                pair("/R/Head", "element 'Head' is abstract"),
                pair("/R/T", "element 'T' has abstract type 'AT'"),
            ]
        );
    }

    #[test]
    fn test_substitution_group_member_and_xsi_type() {
        let xml = format!(
            r#"<R {}><Sub>x</Sub><T xsi:type="CT"><Z>z</Z><W>3</W></T><P>1.00</P></R>"#,
            XSI
        );
        let result = check_substitutable(&xml);
        assert!(result.is_valid(), "{:?}", messages(&result));
    }

    #[test]
    fn test_xsi_type_must_derive_from_declared_type() {
        let xml = format!(
            r#"<R {}><Sub>x</Sub><T xsi:type="xs:string" xmlns:xs="http://www.w3.org/2001/XMLSchema"><Z>z</Z></T><P>1</P></R>"#,
            XSI
        );
        let all = messages(&check_substitutable(&xml)).join("\n");
        assert!(all.contains("is not derived from the declared type 'AT'"), "{}", all);

        let xml = format!(r#"<R {}><Sub>x</Sub><T xsi:type="Nope"><Z>z</Z></T><P>1</P></R>"#, XSI);
        let all = messages(&check_substitutable(&xml)).join("\n");
        assert!(all.contains("xsi:type 'Nope' does not name a type"), "{}", all);
    }

    #[test]
    fn test_single_misplaced_element_is_one_defect() {
        let result = check_substitutable("<S><B>Y</B><A>z</A><C>1</C><C>2</C><C>3</C></S>");
        assert_eq!(located(&result), vec![pair("/S", "element 'A' is out of order")]);
    }

    #[test]
    fn test_stray_element_does_not_hide_siblings() {
        let result = check_substitutable("<S><A>a</A><X/><B>b</B><C>1</C></S>");
        assert_eq!(located(&result), vec![pair("/S", "unexpected element 'X'")]);

        let result = check_substitutable("<S><A>a</A><B>b</B><C>1</C><B>again</B><C>x</C></S>");
        let all = located(&result);
        assert_eq!(all.len(), 2, "{:?}", all);
        assert_eq!(all[0].0, "/S");
        assert!(all[0].1.starts_with("unexpected element 'B'"), "{:?}", all);
        assert_eq!(all[1].0, "/S/C[2]");
        assert!(all[1].1.starts_with("invalid value 'x'"), "{:?}", all);
    }
}
