//! Matching raw material demand against resource nodes

use std::collections::{BTreeMap, HashMap};

use crate::catalog::Catalog;
use crate::models::ResourceNode;

/// Supply and demand for one raw material, all rates per minute
#[derive(Debug, Clone, PartialEq)]
pub struct Availability {
    pub required: f64,
    pub available: f64,
    pub shortage: f64,
    pub utilization_pct: f64,
}

pub type AvailabilityReport = BTreeMap<String, Availability>;

/// Compare required raw material rates with what the given nodes can supply.
///
/// Materials with a zero required rate are left out.
pub fn match_resources(
    catalog: &Catalog,
    raw_materials: &BTreeMap<String, f64>,
    nodes: &[ResourceNode],
) -> AvailabilityReport {
    let mut by_kind: HashMap<&str, Vec<&ResourceNode>> = HashMap::new();
    for node in nodes {
        by_kind.entry(node.resource.as_str()).or_default().push(node);
    }

    raw_materials
        .iter()
        .filter(|(_, required)| **required != 0.0)
        .map(|(item, &required)| {
            let available: f64 = by_kind
                .get(item.as_str())
                .map(|nodes| {
                    nodes
                        .iter()
                        .map(|n| n.output_rate(catalog.base_extraction_rate(&n.resource, n.miner_tier)))
                        .sum()
                })
                .unwrap_or(0.0);

            let utilization_pct = if available > 0.0 {
                (required / available * 100.0).min(100.0)
            } else {
                0.0
            };

            (
                item.clone(),
                Availability {
                    required,
                    available,
                    shortage: (required - available).max(0.0),
                    utilization_pct,
                },
            )
        })
        .collect()
}
