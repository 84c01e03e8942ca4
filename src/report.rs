//! Text and CSV rendering of resolution results
//!
//! Building counts are rounded up here and only here; the resolver keeps
//! them fractional.

use std::fmt;
use std::io::{self, Write};

use crate::availability::AvailabilityReport;
use crate::calculator::{NodeKind, ProductionNode, Resolution};

/// Whole buildings needed to cover a fractional count
pub fn whole_buildings(count: f64) -> u64 {
    // tolerate float noise like 2.0000000000000004
    let rounded = count.round();
    if (count - rounded).abs() < 1e-9 {
        rounded.max(0.0) as u64
    } else {
        count.ceil().max(0.0) as u64
    }
}

/// Format a production tree as indented text
pub fn format_production_tree(node: &ProductionNode) -> String {
    let mut output = String::new();
    for n in node.iter() {
        let prefix = "  ".repeat(n.depth);
        let line = match &n.kind {
            NodeKind::Produced {
                recipe,
                building,
                buildings,
            } => format!(
                "{}{} @ {:.3}/min  [{:.2}x {} via {}]\n",
                prefix, n.name, n.rate_per_min, buildings, building, recipe
            ),
            NodeKind::Raw => format!("{}→ {} @ {:.3}/min (raw input)\n", prefix, n.name, n.rate_per_min),
            NodeKind::Cycle => format!(
                "{}↺ {} @ {:.3}/min (circular, treated as input)\n",
                prefix, n.name, n.rate_per_min
            ),
        };
        output.push_str(&line);
    }
    output
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Production Summary ===")?;
        writeln!(f, "Target: {} @ {:.3}/min", self.target, self.rate_per_min)?;
        writeln!(f)?;

        writeln!(f, "Buildings required:")?;
        for (name, count) in &self.buildings_needed {
            writeln!(f, "  {:>4}x {} ({:.2})", whole_buildings(*count), name, count)?;
        }
        writeln!(f)?;

        writeln!(f, "Recipes used:")?;
        let mut recipes: Vec<_> = self.recipes_used.values().collect();
        recipes.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.recipe_name.cmp(&b.recipe_name)));
        for usage in recipes {
            writeln!(
                f,
                "  [{}] {} in {:.2}x {}",
                usage.depth, usage.recipe_name, usage.buildings, usage.building
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Raw inputs required:")?;
        for (item, rate) in &self.raw_materials {
            writeln!(f, "  {} @ {:.3}/min", item, rate)?;
        }
        writeln!(f)?;

        writeln!(f, "Power: {:.1} MW", self.power_mw)?;

        if !self.warnings.is_empty() {
            writeln!(f)?;
            writeln!(f, "Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "  {}", warning)?;
            }
        }

        Ok(())
    }
}

/// Write the recipes-used table as CSV, rounding building counts up.
pub fn write_recipes_csv<W: Write>(resolution: &Resolution, mut out: W) -> io::Result<()> {
    writeln!(out, "recipe,building,buildings,exact_buildings,depth,outputs_per_min")?;

    let mut recipes: Vec<_> = resolution.recipes_used.values().collect();
    recipes.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.recipe_name.cmp(&b.recipe_name)));

    for usage in recipes {
        let outputs = usage
            .products_per_min
            .iter()
            .map(|(item, rate)| format!("{}:{}", item, rate * usage.buildings))
            .collect::<Vec<_>>()
            .join(";");
        writeln!(
            out,
            "{},{},{},{:.4},{},{}",
            csv_field(&usage.recipe_name),
            csv_field(&usage.building),
            whole_buildings(usage.buildings),
            usage.buildings,
            usage.depth,
            csv_field(&outputs)
        )?;
    }
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render an availability report as a table
pub struct AvailabilityTable<'a>(pub &'a AvailabilityReport);

impl fmt::Display for AvailabilityTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<30} {:>10} {:>10} {:>10} {:>7}",
            "Resource", "Required", "Available", "Shortage", "Use %"
        )?;
        writeln!(f, "{}", "-".repeat(71))?;
        for (item, a) in self.0 {
            writeln!(
                f,
                "{:<30} {:>10.2} {:>10.2} {:>10.2} {:>6.1}%",
                item, a.required, a.available, a.shortage, a.utilization_pct
            )?;
        }
        Ok(())
    }
}
