//! In-memory recipe catalog
//!
//! The catalog is built once from a [`CatalogDocument`] and is read-only
//! afterwards, so any number of resolutions can share it.
//!
//! # Recipe selection
//!
//! Every product resolves to exactly one canonical recipe: the first recipe
//! in catalog order that produces it and isn't excluded by the
//! [`RecipePolicy`]. The default policy drops alternate recipes, either
//! flagged `alternate` in the data or named/keyed like one.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, ModelError};
use crate::models::{Building, Miner, Recipe, Resource};

/// Base extraction rate used when no extractor matches a node (Miner Mk.1).
pub const DEFAULT_EXTRACTION_RATE: f64 = 60.0;

/// Default patterns matched against recipe keys and names.
const ALTERNATE_PATTERNS: &[&str] = &[r"(?i)^alternate\b", r"(?i)^recipe_alternate"];

// Serialized catalog layout

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub recipes: Vec<RecipeEntry>,
    /// Keyed by recipe category
    #[serde(default)]
    pub buildings: BTreeMap<String, BuildingEntry>,
    /// Keyed by item key
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceEntry>,
    /// Keyed by extractor id
    #[serde(default)]
    pub miners: BTreeMap<String, MinerEntry>,
    /// Display names for intermediate items
    #[serde(default)]
    pub items: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeEntry {
    pub key: String,
    pub name: String,
    pub category: String,
    pub time: f64,
    #[serde(default)]
    pub ingredients: Vec<ItemAmount>,
    #[serde(default)]
    pub products: Vec<ItemAmount>,
    #[serde(default)]
    pub alternate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemAmount {
    pub item: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingEntry {
    pub name: String,
    #[serde(default)]
    pub power: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub name: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinerEntry {
    pub name: String,
    pub category: String,
    pub tier: u32,
    pub rate: f64,
}

impl CatalogDocument {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read a JSON catalog document from disk
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            file: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content).map_err(|source| CatalogError::Json {
            file: path.to_path_buf(),
            source,
        })
    }

    /// Fold another fragment into this one. Recipes are appended, keyed
    /// entries from `other` replace existing ones.
    pub fn merge(&mut self, other: CatalogDocument) {
        self.recipes.extend(other.recipes);
        self.buildings.extend(other.buildings);
        self.resources.extend(other.resources);
        self.miners.extend(other.miners);
        self.items.extend(other.items);
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
            && self.buildings.is_empty()
            && self.resources.is_empty()
            && self.miners.is_empty()
            && self.items.is_empty()
    }
}

impl RecipeEntry {
    /// Validate the entry into a [`Recipe`]
    pub fn to_recipe(&self) -> Result<Recipe, ModelError> {
        let amounts = |list: &[ItemAmount]| -> Vec<(String, f64)> {
            list.iter().map(|a| (a.item.clone(), a.amount)).collect()
        };
        Recipe::new(
            self.key.clone(),
            self.name.clone(),
            self.category.clone(),
            self.time,
            amounts(&self.ingredients),
            amounts(&self.products),
        )
        .map(|recipe| recipe.with_alternate(self.alternate))
    }
}

/// Decides which recipes may be picked as the canonical recipe of a product.
#[derive(Debug, Clone)]
pub struct RecipePolicy {
    pub allow_alternates: bool,
    alternates: Vec<Regex>,
    excluded: Vec<Regex>,
}

impl Default for RecipePolicy {
    fn default() -> Self {
        let alternates = ALTERNATE_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect();
        Self {
            allow_alternates: false,
            alternates,
            excluded: Vec::new(),
        }
    }
}

impl RecipePolicy {
    /// A policy that excludes nothing
    pub fn permissive() -> Self {
        Self::default().allow_alternates(true)
    }

    pub fn allow_alternates(mut self, allow: bool) -> Self {
        self.allow_alternates = allow;
        self
    }

    /// Exclude recipes whose key or name matches `pattern`
    pub fn exclude(mut self, pattern: &str) -> Result<Self, CatalogError> {
        self.excluded.push(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn permits(&self, recipe: &Recipe) -> bool {
        let matches = |re: &Regex| re.is_match(&recipe.key) || re.is_match(&recipe.name);

        if !self.allow_alternates && (recipe.alternate || self.alternates.iter().any(matches)) {
            return false;
        }
        !self.excluded.iter().any(matches)
    }
}

/// Read-only catalog of recipes, buildings, resources and extractors.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    recipes: Vec<Recipe>,
    by_key: HashMap<String, usize>,
    by_product: HashMap<String, usize>,
    buildings: HashMap<String, Building>,
    resources: HashMap<String, Resource>,
    miners: HashMap<String, Miner>,
    extractors: HashMap<(String, u32), String>,
    items: HashMap<String, String>,
    rejected: Vec<ModelError>,
}

impl Catalog {
    /// Build a catalog. Recipes that fail validation are skipped and kept
    /// in [`Catalog::rejected`].
    pub fn from_document(doc: &CatalogDocument, policy: &RecipePolicy) -> Self {
        let mut catalog = Catalog::default();

        for entry in &doc.recipes {
            let recipe = match entry.to_recipe() {
                Ok(recipe) => recipe,
                Err(e) => {
                    log::warn!("skipping recipe: {}", e);
                    catalog.rejected.push(e);
                    continue;
                }
            };
            if catalog.by_key.contains_key(&recipe.key) {
                log::warn!("duplicate recipe key '{}', keeping the first", recipe.key);
                continue;
            }

            let index = catalog.recipes.len();
            if policy.permits(&recipe) {
                for (item, _) in recipe.products() {
                    catalog.by_product.entry(item.clone()).or_insert(index);
                }
            } else {
                log::debug!("recipe '{}' excluded by policy", recipe.name);
            }
            catalog.by_key.insert(recipe.key.clone(), index);
            catalog.recipes.push(recipe);
        }

        for (category, entry) in &doc.buildings {
            catalog.buildings.insert(
                category.clone(),
                Building {
                    category: category.clone(),
                    name: entry.name.clone(),
                    power_mw: entry.power,
                },
            );
        }

        for (key, entry) in &doc.resources {
            catalog.resources.insert(
                key.clone(),
                Resource {
                    key: key.clone(),
                    name: entry.name.clone(),
                    category: entry.category.clone(),
                },
            );
        }

        // BTreeMap iteration makes the first key win for a (category, tier) pair.
        for (key, entry) in &doc.miners {
            catalog
                .extractors
                .entry((entry.category.clone(), entry.tier))
                .or_insert_with(|| key.clone());
            catalog.miners.insert(
                key.clone(),
                Miner {
                    key: key.clone(),
                    name: entry.name.clone(),
                    category: entry.category.clone(),
                    tier: entry.tier,
                    rate_per_min: entry.rate,
                },
            );
        }

        catalog.items = doc
            .items
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        log::debug!(
            "catalog: {} recipes ({} producible items), {} buildings, {} resources, {} miners",
            catalog.recipes.len(),
            catalog.by_product.len(),
            catalog.buildings.len(),
            catalog.resources.len(),
            catalog.miners.len()
        );

        catalog
    }

    /// Load a JSON catalog, failing on any I/O or parse problem
    pub fn from_path(path: &Path, policy: &RecipePolicy) -> Result<Self, CatalogError> {
        let doc = CatalogDocument::from_path(path)?;
        Ok(Self::from_document(&doc, policy))
    }

    /// Load a JSON catalog, substituting an empty catalog when the file is
    /// missing or unusable. Lookups on the empty catalog degrade to "no recipe".
    pub fn load_or_empty(path: &Path, policy: &RecipePolicy) -> Self {
        match Self::from_path(path, policy) {
            Ok(catalog) => catalog,
            Err(e) => {
                log::warn!("catalog unavailable, continuing with an empty one: {}", e);
                Catalog::default()
            }
        }
    }

    /// The canonical recipe producing `item`
    pub fn recipe_for(&self, item: &str) -> Option<&Recipe> {
        self.by_product.get(item).map(|&i| &self.recipes[i])
    }

    /// Look up a recipe by its key, regardless of policy
    pub fn recipe(&self, key: &str) -> Option<&Recipe> {
        self.by_key.get(key).map(|&i| &self.recipes[i])
    }

    /// All valid recipes in catalog order
    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn building_for(&self, category: &str) -> Option<&Building> {
        self.buildings.get(category)
    }

    pub fn buildings(&self) -> impl Iterator<Item = &Building> {
        self.buildings.values()
    }

    pub fn resource(&self, key: &str) -> Option<&Resource> {
        self.resources.get(key)
    }

    pub fn miner(&self, key: &str) -> Option<&Miner> {
        self.miners.get(key)
    }

    /// Display name for an item, falling back to the key itself
    pub fn item_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.items
            .get(key)
            .map(String::as_str)
            .or_else(|| self.resources.get(key).map(|r| r.name.as_str()))
            .unwrap_or(key)
    }

    /// The extractor servicing `resource` at `tier`
    pub fn extractor(&self, resource: &str, tier: u32) -> Option<&Miner> {
        self.resources
            .get(resource)
            .and_then(|r| self.extractors.get(&(r.category.clone(), tier)))
            .and_then(|key| self.miner(key))
    }

    /// Base output per minute of the extractor servicing `resource` at `tier`
    pub fn base_extraction_rate(&self, resource: &str, tier: u32) -> f64 {
        self.extractor(resource, tier)
            .map_or(DEFAULT_EXTRACTION_RATE, |m| m.rate_per_min)
    }

    /// Items with a canonical recipe, sorted
    pub fn producible_items(&self) -> Vec<&str> {
        let mut items: Vec<&str> = self.by_product.keys().map(String::as_str).collect();
        items.sort_unstable();
        items
    }

    /// Recipes dropped during construction
    pub fn rejected(&self) -> &[ModelError] {
        &self.rejected
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
            && self.buildings.is_empty()
            && self.resources.is_empty()
            && self.miners.is_empty()
            && self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "recipes": [
            {"key": "Recipe_Alternate_CastScrew_C", "name": "Alternate: Cast Screw", "category": "constructor",
             "time": 24, "ingredients": [{"item": "iron-ingot", "amount": 5}],
             "products": [{"item": "screw", "amount": 20}]},
            {"key": "Recipe_Screw_C", "name": "Screw", "category": "constructor", "time": 6,
             "ingredients": [{"item": "iron-rod", "amount": 1}],
             "products": [{"item": "screw", "amount": 4}]},
            {"key": "Recipe_Broken_C", "name": "Broken", "category": "constructor", "time": 0,
             "products": [{"item": "nothing", "amount": 1}]}
        ],
        "buildings": {"constructor": {"name": "Constructor", "power": 4}},
        "resources": {"iron-ore": {"name": "Iron Ore", "category": "solid"}},
        "miners": {
            "Build_MinerMk1_C": {"name": "Miner Mk.1", "category": "solid", "tier": 1, "rate": 60},
            "Build_MinerMk2_C": {"name": "Miner Mk.2", "category": "solid", "tier": 2, "rate": 120}
        },
        "items": {"screw": "Screw"}
    }"#;

    fn catalog(policy: &RecipePolicy) -> Catalog {
        let doc = CatalogDocument::from_json_str(JSON).unwrap();
        Catalog::from_document(&doc, policy)
    }

    #[test]
    fn default_policy_skips_alternates() {
        let catalog = catalog(&RecipePolicy::default());
        assert_eq!(catalog.recipe_for("screw").unwrap().key, "Recipe_Screw_C");
        // still reachable by key
        assert!(catalog.recipe("Recipe_Alternate_CastScrew_C").is_some());
    }

    #[test]
    fn allowing_alternates_uses_catalog_order() {
        let catalog = catalog(&RecipePolicy::default().allow_alternates(true));
        assert_eq!(
            catalog.recipe_for("screw").unwrap().key,
            "Recipe_Alternate_CastScrew_C"
        );
    }

    #[test]
    fn custom_exclusion_pattern() {
        let policy = RecipePolicy::permissive().exclude("^Recipe_Screw").unwrap();
        let catalog = catalog(&policy);
        assert_eq!(
            catalog.recipe_for("screw").unwrap().key,
            "Recipe_Alternate_CastScrew_C"
        );
        assert!(RecipePolicy::permissive().exclude("(").is_err());
    }

    #[test]
    fn invalid_recipes_are_rejected() {
        let catalog = catalog(&RecipePolicy::default());
        assert_eq!(catalog.recipes().len(), 2);
        assert_eq!(catalog.rejected().len(), 1);
        assert!(catalog.recipe_for("nothing").is_none());
    }

    #[test]
    fn lookups() {
        let catalog = catalog(&RecipePolicy::default());
        assert_eq!(catalog.building_for("constructor").unwrap().power_mw, 4.0);
        assert_eq!(catalog.item_name("screw"), "Screw");
        assert_eq!(catalog.item_name("iron-ore"), "Iron Ore");
        assert_eq!(catalog.item_name("mystery"), "mystery");
        assert_eq!(catalog.base_extraction_rate("iron-ore", 2), 120.0);
        assert_eq!(catalog.base_extraction_rate("iron-ore", 3), DEFAULT_EXTRACTION_RATE);
        assert_eq!(catalog.base_extraction_rate("copper-ore", 1), DEFAULT_EXTRACTION_RATE);
        assert_eq!(catalog.producible_items(), vec!["screw"]);

        assert_eq!(catalog.extractor("iron-ore", 1).unwrap().name, "Miner Mk.1");
        assert!(catalog.extractor("iron-ore", 3).is_none());
        assert_eq!(catalog.miner("Build_MinerMk2_C").unwrap().tier, 2);
    }

    #[test]
    fn catalog_with_only_miners_or_items_is_not_empty() {
        let miners_only = CatalogDocument::from_json_str(
            r#"{"miners": {"Build_MinerMk1_C": {"name": "Miner Mk.1", "category": "solid", "tier": 1, "rate": 60}}}"#,
        )
        .unwrap();
        let items_only = CatalogDocument::from_json_str(r#"{"items": {"screw": "Screw"}}"#).unwrap();

        for doc in [miners_only, items_only] {
            assert!(!doc.is_empty());
            assert!(!Catalog::from_document(&doc, &RecipePolicy::default()).is_empty());
        }
        assert!(Catalog::from_document(&CatalogDocument::default(), &RecipePolicy::default()).is_empty());
    }

    #[test]
    fn missing_file_gives_empty_catalog() {
        let path = std::env::temp_dir().join("satisfactory-calculator-does-not-exist.json");
        let catalog = Catalog::load_or_empty(&path, &RecipePolicy::default());
        assert!(catalog.is_empty());
        assert!(catalog.recipe_for("iron-plate").is_none());
        assert!(Catalog::from_path(&path, &RecipePolicy::default()).is_err());
    }

    #[test]
    fn merge_appends_recipes_and_replaces_keyed_entries() {
        let mut base = CatalogDocument::from_json_str(JSON).unwrap();
        let extra = CatalogDocument::from_json_str(
            r#"{"buildings": {"constructor": {"name": "Constructor Mk.2", "power": 5}},
                "recipes": [{"key": "Recipe_IronRod_C", "name": "Iron Rod", "category": "constructor",
                             "time": 4, "ingredients": [{"item": "iron-ingot", "amount": 1}],
                             "products": [{"item": "iron-rod", "amount": 1}]}]}"#,
        )
        .unwrap();
        base.merge(extra);
        assert_eq!(base.recipes.len(), 4);
        assert_eq!(base.recipes[3].key, "Recipe_IronRod_C");
        assert_eq!(base.buildings["constructor"].name, "Constructor Mk.2");
    }
}
