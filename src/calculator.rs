//! Production chain calculator logic
//!
//! Walks the recipe graph backwards from a target item, turning the target
//! rate into fractional building counts and ingredient rates, and collects
//! per-recipe, per-building and raw material totals along the way.
//!
//! The walk is depth-first over an explicit stack of frames rather than
//! native recursion, so very deep recipe chains can't exhaust the call
//! stack. Cycle detection only looks at the items on the active path: an
//! item reached again through an unrelated branch is not a cycle.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::availability::{self, AvailabilityReport};
use crate::catalog::Catalog;
use crate::models::{Recipe, ResourceNode};

/// Non-fatal problems found while resolving a chain
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// The target itself has no recipe
    MissingRecipe { item: String },
    /// The canonical recipe lists the item but yields none of it
    ZeroOutputRecipe { recipe: String, item: String },
    /// The active path from the root followed by the repeated item
    CircularDependency { path: Vec<String> },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::MissingRecipe { item } => write!(f, "no recipe found for {}", item),
            Warning::ZeroOutputRecipe { recipe, item } => {
                write!(f, "recipe {} produces 0 of {}", recipe, item)
            }
            Warning::CircularDependency { path } => {
                write!(f, "circular dependency: {}", path.join(" → "))
            }
        }
    }
}

/// How a tree node was resolved
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Produced {
        recipe: String,
        building: String,
        /// Fractional, rounded only for display
        buildings: f64,
    },
    Raw,
    Cycle,
}

/// One step of the production tree
///
/// `Clone`, `PartialEq`, `Debug` and `Drop` all walk the tree with an
/// explicit stack, so they are safe on chains of any depth.
pub struct ProductionNode {
    pub item: String,
    pub name: String,
    pub rate_per_min: f64,
    pub depth: usize,
    pub kind: NodeKind,
    pub children: Vec<ProductionNode>,
}

impl ProductionNode {
    fn leaf(catalog: &Catalog, item: &str, rate: f64, depth: usize, kind: NodeKind) -> Self {
        Self {
            item: item.to_string(),
            name: catalog.item_name(item).to_string(),
            rate_per_min: rate,
            depth,
            kind,
            children: Vec::new(),
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self.kind, NodeKind::Raw)
    }

    pub fn is_cycle(&self) -> bool {
        matches!(self.kind, NodeKind::Cycle)
    }

    pub fn recipe(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Produced { recipe, .. } => Some(recipe),
            _ => None,
        }
    }

    pub fn buildings(&self) -> f64 {
        match self.kind {
            NodeKind::Produced { buildings, .. } => buildings,
            _ => 0.0,
        }
    }

    /// Depth-first iterator over this node and all descendants
    pub fn iter(&self) -> impl Iterator<Item = &ProductionNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Copy of this node without its children
    fn shallow(&self) -> Self {
        Self {
            item: self.item.clone(),
            name: self.name.clone(),
            rate_per_min: self.rate_per_min,
            depth: self.depth,
            kind: self.kind.clone(),
            children: Vec::new(),
        }
    }

    fn same_fields(&self, other: &Self) -> bool {
        self.item == other.item
            && self.name == other.name
            && self.rate_per_min == other.rate_per_min
            && self.depth == other.depth
            && self.kind == other.kind
    }
}

impl Clone for ProductionNode {
    fn clone(&self) -> Self {
        // Pre-order copies with parent indices. Every descendant of a node has
        // a larger index, so popping from the back completes a node before it
        // is attached to its parent.
        let mut nodes = Vec::new();
        let mut parents = Vec::new();
        let mut stack = vec![(self, 0)];
        while let Some((node, parent)) = stack.pop() {
            let index = nodes.len();
            nodes.push(node.shallow());
            parents.push(parent);
            stack.extend(node.children.iter().rev().map(|child| (child, index)));
        }

        while nodes.len() > 1 {
            let Some(mut node) = nodes.pop() else { break };
            // children were attached last to first
            node.children.reverse();
            let parent = parents[nodes.len()];
            nodes[parent].children.push(node);
        }

        let mut root = nodes.pop().unwrap_or_else(|| self.shallow());
        root.children.reverse();
        root
    }
}

impl PartialEq for ProductionNode {
    fn eq(&self, other: &Self) -> bool {
        let mut stack = vec![(self, other)];
        while let Some((a, b)) = stack.pop() {
            if !a.same_fields(b) || a.children.len() != b.children.len() {
                return false;
            }
            stack.extend(a.children.iter().zip(&b.children));
        }
        true
    }
}

impl fmt::Debug for ProductionNode {
    /// Flat pre-order listing; `depth` carries the nesting.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter().map(NodeFields)).finish()
    }
}

struct NodeFields<'a>(&'a ProductionNode);

impl fmt::Debug for NodeFields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.0;
        f.debug_struct("ProductionNode")
            .field("item", &node.item)
            .field("name", &node.name)
            .field("rate_per_min", &node.rate_per_min)
            .field("depth", &node.depth)
            .field("kind", &node.kind)
            .field("children", &node.children.len())
            .finish()
    }
}

// Deep trees would otherwise be dropped recursively.
impl Drop for ProductionNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

/// Totals for one recipe across the whole tree
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeUsage {
    pub recipe_key: String,
    pub recipe_name: String,
    pub building: String,
    pub buildings: f64,
    /// Per building
    pub products_per_min: Vec<(String, f64)>,
    /// Per building
    pub ingredients_per_min: Vec<(String, f64)>,
    /// Shallowest depth the recipe appears at
    pub depth: usize,
}

/// Everything a resolution produces. Owned by the caller, never shared.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub target: String,
    pub rate_per_min: f64,
    pub tree: ProductionNode,
    pub recipes_used: BTreeMap<String, RecipeUsage>,
    pub buildings_needed: BTreeMap<String, f64>,
    pub raw_materials: BTreeMap<String, f64>,
    pub power_mw: f64,
    pub warnings: Vec<Warning>,
}

impl Resolution {
    /// True when the chain resolved without caveats
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Result of [`calculate`]
#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    pub resolution: Resolution,
    pub availability: Option<AvailabilityReport>,
}

/// Resolve a chain and, when nodes are given, match its raw materials against them.
pub fn calculate(
    catalog: &Catalog,
    target_item: &str,
    rate_per_min: f64,
    nodes: Option<&[ResourceNode]>,
) -> Calculation {
    let resolution = resolve(catalog, target_item, rate_per_min);
    let availability =
        nodes.map(|nodes| availability::match_resources(catalog, &resolution.raw_materials, nodes));
    Calculation {
        resolution,
        availability,
    }
}

/// Resolve the full production chain for `target_item` at `rate_per_min`.
pub fn resolve(catalog: &Catalog, target_item: &str, rate_per_min: f64) -> Resolution {
    let mut acc = Accumulator::default();

    if catalog.recipe_for(target_item).is_none() {
        log::warn!("no recipe found for {}", target_item);
        acc.raw(target_item, rate_per_min);
        acc.warn(Warning::MissingRecipe {
            item: target_item.to_string(),
        });
        let tree = ProductionNode::leaf(catalog, target_item, rate_per_min, 0, NodeKind::Raw);
        return acc.finish(target_item, rate_per_min, tree);
    }

    let mut path = ActivePath::default();
    let mut stack: Vec<Frame> = Vec::new();
    let mut root = None;

    match visit(catalog, target_item, rate_per_min, 0, &path, &mut acc) {
        Visit::Leaf(node) => root = Some(node),
        Visit::Expand(node, inputs) => {
            path.push(&node.item);
            stack.push(Frame::new(node, inputs));
        }
    }

    while let Some(frame) = stack.last_mut() {
        let depth = frame.node.depth + 1;
        match frame.pending.next() {
            Some((item, rate)) => match visit(catalog, &item, rate, depth, &path, &mut acc) {
                Visit::Leaf(node) => frame.node.children.push(node),
                Visit::Expand(node, inputs) => {
                    path.push(&node.item);
                    stack.push(Frame::new(node, inputs));
                }
            },
            None => {
                let Some(done) = stack.pop() else { break };
                path.pop();
                match stack.last_mut() {
                    Some(parent) => parent.node.children.push(done.node),
                    None => root = Some(done.node),
                }
            }
        }
    }

    let tree = root.unwrap_or_else(|| {
        ProductionNode::leaf(catalog, target_item, rate_per_min, 0, NodeKind::Raw)
    });
    acc.finish(target_item, rate_per_min, tree)
}

/// Outcome of entering one item
enum Visit {
    Leaf(ProductionNode),
    /// Node plus the ingredient rates still to expand beneath it
    Expand(ProductionNode, Vec<(String, f64)>),
}

fn visit(
    catalog: &Catalog,
    item: &str,
    rate: f64,
    depth: usize,
    path: &ActivePath,
    acc: &mut Accumulator,
) -> Visit {
    if path.contains(item) {
        let cycle = path.cycle_to(item);
        log::warn!("circular dependency: {}", cycle.join(" → "));
        acc.raw(item, rate);
        acc.warn(Warning::CircularDependency { path: cycle });
        return Visit::Leaf(ProductionNode::leaf(catalog, item, rate, depth, NodeKind::Cycle));
    }

    let Some(recipe) = catalog.recipe_for(item) else {
        acc.raw(item, rate);
        return Visit::Leaf(ProductionNode::leaf(catalog, item, rate, depth, NodeKind::Raw));
    };

    let output_rate = recipe.product_rate(item);
    if output_rate <= 0.0 {
        log::warn!("recipe {} produces 0 of {}", recipe.name, item);
        acc.raw(item, rate);
        acc.warn(Warning::ZeroOutputRecipe {
            recipe: recipe.name.clone(),
            item: item.to_string(),
        });
        return Visit::Leaf(ProductionNode::leaf(catalog, item, rate, depth, NodeKind::Raw));
    }

    let buildings = rate / output_rate;
    let (building, power_mw) = match catalog.building_for(&recipe.category) {
        Some(b) => (b.name.clone(), b.power_mw),
        None => {
            log::debug!("no building for category '{}'", recipe.category);
            (recipe.category.clone(), 0.0)
        }
    };

    acc.recipe(recipe, &building, depth, buildings);
    *acc.buildings.entry(building.clone()).or_default() += buildings;
    acc.power_mw += power_mw * buildings;

    log::debug!(
        "{}{} @ {:.3}/min via {} ({:.3}x {})",
        "  ".repeat(depth),
        item,
        rate,
        recipe.name,
        buildings,
        building
    );

    let inputs = recipe
        .ingredients_per_minute()
        .into_iter()
        .map(|(ingredient, per_building)| (ingredient, per_building * buildings))
        .collect();

    let node = ProductionNode::leaf(
        catalog,
        item,
        rate,
        depth,
        NodeKind::Produced {
            recipe: recipe.name.clone(),
            building,
            buildings,
        },
    );
    Visit::Expand(node, inputs)
}

/// A node whose ingredients are still being expanded
struct Frame {
    node: ProductionNode,
    pending: std::vec::IntoIter<(String, f64)>,
}

impl Frame {
    fn new(node: ProductionNode, inputs: Vec<(String, f64)>) -> Self {
        Self {
            node,
            pending: inputs.into_iter(),
        }
    }
}

/// Items currently being expanded, root first
#[derive(Debug, Default)]
struct ActivePath {
    order: Vec<String>,
    members: HashSet<String>,
}

impl ActivePath {
    fn push(&mut self, item: &str) {
        self.order.push(item.to_string());
        self.members.insert(item.to_string());
    }

    fn pop(&mut self) {
        if let Some(item) = self.order.pop() {
            self.members.remove(&item);
        }
    }

    fn contains(&self, item: &str) -> bool {
        self.members.contains(item)
    }

    /// The full active path followed by the repeated item
    fn cycle_to(&self, item: &str) -> Vec<String> {
        let mut cycle = self.order.clone();
        cycle.push(item.to_string());
        cycle
    }
}

/// Aggregate tables for one resolution call
#[derive(Debug, Default)]
struct Accumulator {
    recipes: BTreeMap<String, RecipeUsage>,
    buildings: BTreeMap<String, f64>,
    raw: BTreeMap<String, f64>,
    power_mw: f64,
    warnings: Vec<Warning>,
}

impl Accumulator {
    fn raw(&mut self, item: &str, rate: f64) {
        *self.raw.entry(item.to_string()).or_default() += rate;
    }

    fn warn(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    fn recipe(&mut self, recipe: &Recipe, building: &str, depth: usize, buildings: f64) {
        let usage = self
            .recipes
            .entry(recipe.name.clone())
            .or_insert_with(|| RecipeUsage {
                recipe_key: recipe.key.clone(),
                recipe_name: recipe.name.clone(),
                building: building.to_string(),
                buildings: 0.0,
                products_per_min: recipe.products_per_minute(),
                ingredients_per_min: recipe.ingredients_per_minute(),
                depth,
            });
        usage.buildings += buildings;
        usage.depth = usage.depth.min(depth);
    }

    fn finish(self, target: &str, rate_per_min: f64, tree: ProductionNode) -> Resolution {
        Resolution {
            target: target.to_string(),
            rate_per_min,
            tree,
            recipes_used: self.recipes,
            buildings_needed: self.buildings,
            raw_materials: self.raw,
            power_mw: self.power_mw,
            warnings: self.warnings,
        }
    }
}
