//! Repetition controller
//!
//! Collects the instances of a repeatable particle. The particle's
//! `minOccurs` instances are always collected; after that the input
//! surface decides, once per completed instance, whether another follows,
//! up to the effective bound.

use tracing::debug;

use crate::error::Result;
use crate::validators::ParticleDescriptor;

use super::collector::Collector;
use super::resolver::Section;
use super::values::ValueNode;

/// Effective number of instances a particle may get in one run.
///
/// The smallest of `maxOccurs`, the configured bound and the hard limit,
/// never below the particle's own minimum (or one).
pub fn repetition_bound(particle: &ParticleDescriptor, configured: Option<u32>, limit: u32) -> u32 {
    let floor = particle.occurs.min.max(1);
    let bound = [particle.occurs.max, configured, Some(limit)]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(limit);
    bound.max(floor)
}

/// Collect every instance of a repeatable particle at `path`
pub fn collect_repeating(
    collector: &mut Collector<'_>,
    particle: &ParticleDescriptor,
    path: &str,
) -> Result<Vec<ValueNode>> {
    let config = collector.config();
    let bound = repetition_bound(particle, config.max_repetitions, config.limits.max_repetitions);
    let minimum = particle.occurs.min;
    let mut instances = Vec::new();

    loop {
        let index = instances.len() + 1;
        let instance_path = format!("{}[{}]", path, index);
        instances.push(collector.collect_particle(particle, &instance_path)?);

        let count = instances.len() as u32;
        if count >= bound {
            debug!(path, count, "repetition bound reached");
            break;
        }
        if count < minimum {
            continue;
        }
        let section = Section {
            path: path.to_string(),
            name: particle.name.clone(),
            count: instances.len(),
        };
        if !collector.should_continue(&section) {
            break;
        }
    }

    debug!(path, instances = instances.len(), "repeatable section collected");
    Ok(instances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::generator::resolver::{LeafField, Paired};
    use crate::namespaces::QName;
    use crate::validators::{Occurs, SchemaModel, TypeId};

    fn particle(min: u32, max: Option<u32>) -> ParticleDescriptor {
        ParticleDescriptor::new(QName::local("Entry"), Occurs::new(min, max), TypeId(0))
    }

    #[test]
    fn test_repetition_bound() {
        assert_eq!(repetition_bound(&particle(1, None), None, 100), 100);
        assert_eq!(repetition_bound(&particle(1, Some(3)), None, 100), 3);
        assert_eq!(repetition_bound(&particle(1, Some(3)), Some(2), 100), 2);
        assert_eq!(repetition_bound(&particle(1, None), Some(0), 100), 1);
        assert_eq!(repetition_bound(&particle(4, Some(9)), Some(2), 100), 4);
    }

    const SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
      <xs:element name="List">
        <xs:complexType>
          <xs:sequence>
            <xs:element name="Item" type="xs:string" minOccurs="2" maxOccurs="4"/>
          </xs:sequence>
        </xs:complexType>
      </xs:element>
    </xs:schema>"#;

    fn collect_list(config: &GeneratorConfig, more: usize) -> (Vec<String>, Vec<usize>) {
        let model = SchemaModel::from_string(SCHEMA).unwrap();
        let element = model.resolve_root_element("List").unwrap().clone();
        let mut paths = Vec::new();
        let mut asked_counts = Vec::new();
        {
            let mut surface = Paired::new(
                |field: &LeafField| {
                    paths.push(field.path.clone());
                    Some("v".to_string())
                },
                |section: &Section| {
                    asked_counts.push(section.count);
                    section.count < 2 + more
                },
            );
            Collector::new(&model, config, &mut surface)
                .collect_element(&element)
                .unwrap();
        }
        (paths, asked_counts)
    }

    #[test]
    fn test_minimum_instances_are_not_negotiated() {
        let (paths, asked) = collect_list(&GeneratorConfig::default(), 0);
        assert_eq!(paths, vec!["List/Item[1]", "List/Item[2]"]);
        assert_eq!(asked, vec![2]);
    }

    #[test]
    fn test_max_occurs_stops_without_asking() {
        let (paths, asked) = collect_list(&GeneratorConfig::default(), 10);
        assert_eq!(paths.len(), 4);
        assert_eq!(asked, vec![2, 3]);
    }

    #[test]
    fn test_configured_bound_below_minimum() {
        let config = GeneratorConfig::default().with_max_repetitions(1);
        let (paths, asked) = collect_list(&config, 10);
        assert_eq!(paths.len(), 2);
        assert!(asked.is_empty());
    }
}
