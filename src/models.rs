//! Data models for Satisfactory recipes, buildings and resource nodes

use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Recipe durations are in seconds, rates are reported per minute.
pub const SECONDS_PER_MINUTE: f64 = 60.0;

/// A crafting recipe. Validated on construction, immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub key: String,
    pub name: String,
    pub category: String,
    pub alternate: bool,
    time: f64,
    ingredients: Vec<(String, f64)>,
    products: Vec<(String, f64)>,
}

impl Recipe {
    /// Build a recipe, rejecting non-positive durations, negative amounts
    /// and repeated item keys.
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        time: f64,
        ingredients: Vec<(String, f64)>,
        products: Vec<(String, f64)>,
    ) -> Result<Self, ModelError> {
        let key = key.into();

        if !time.is_finite() || time <= 0.0 {
            return Err(ModelError::InvalidDuration { recipe: key, time });
        }
        if let Some((item, amount)) = ingredients
            .iter()
            .chain(&products)
            .find(|(_, amount)| !amount.is_finite() || *amount < 0.0)
        {
            return Err(ModelError::InvalidAmount {
                item: item.clone(),
                amount: *amount,
                recipe: key,
            });
        }
        if let Some(item) = first_duplicate(&ingredients) {
            return Err(ModelError::DuplicateIngredient { recipe: key, item });
        }
        if let Some(item) = first_duplicate(&products) {
            return Err(ModelError::DuplicateProduct { recipe: key, item });
        }

        Ok(Self {
            key,
            name: name.into(),
            category: category.into(),
            alternate: false,
            time,
            ingredients,
            products,
        })
    }

    pub fn with_alternate(mut self, alternate: bool) -> Self {
        self.alternate = alternate;
        self
    }

    /// Processing time of one cycle in seconds (always > 0)
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn ingredients(&self) -> &[(String, f64)] {
        &self.ingredients
    }

    pub fn products(&self) -> &[(String, f64)] {
        &self.products
    }

    /// Items per minute produced by one building running this recipe
    pub fn products_per_minute(&self) -> Vec<(String, f64)> {
        self.per_minute(&self.products)
    }

    /// Items per minute consumed by one building running this recipe
    pub fn ingredients_per_minute(&self) -> Vec<(String, f64)> {
        self.per_minute(&self.ingredients)
    }

    /// Per-minute output of `item`, or 0 when the recipe doesn't make it.
    pub fn product_rate(&self, item: &str) -> f64 {
        self.products
            .iter()
            .find(|(key, _)| key == item)
            .map_or(0.0, |(_, amount)| amount * SECONDS_PER_MINUTE / self.time)
    }

    fn per_minute(&self, amounts: &[(String, f64)]) -> Vec<(String, f64)> {
        amounts
            .iter()
            .map(|(item, amount)| (item.clone(), amount * SECONDS_PER_MINUTE / self.time))
            .collect()
    }
}

fn first_duplicate(amounts: &[(String, f64)]) -> Option<String> {
    amounts
        .iter()
        .enumerate()
        .find(|(i, (item, _))| amounts[..*i].iter().any(|(other, _)| other == item))
        .map(|(_, (item, _))| item.clone())
}

/// A crafting building, keyed in the catalog by the recipe category it runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub category: String,
    pub name: String,
    pub power_mw: f64,
}

/// An extractable resource. The category picks the extractor family.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub key: String,
    pub name: String,
    pub category: String,
}

/// An extractor (miner, water extractor, oil extractor, ...)
#[derive(Debug, Clone, PartialEq)]
pub struct Miner {
    pub key: String,
    pub name: String,
    pub category: String,
    pub tier: u32,
    pub rate_per_min: f64,
}

/// Node purity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purity {
    Impure,
    Normal,
    Pure,
}

impl Purity {
    /// Parse a purity label. Unknown labels count as normal.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "impure" => Purity::Impure,
            "pure" => Purity::Pure,
            "normal" => Purity::Normal,
            other => {
                log::debug!("unknown purity '{}', using normal", other);
                Purity::Normal
            }
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            Purity::Impure => 0.5,
            Purity::Normal => 1.0,
            Purity::Pure => 2.0,
        }
    }
}

impl fmt::Display for Purity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Purity::Impure => "impure",
            Purity::Normal => "normal",
            Purity::Pure => "pure",
        };
        f.write_str(label)
    }
}

/// A resource node on the map together with the extractor placed on it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceNode {
    pub resource: String,
    pub purity: Purity,
    pub miner_tier: u32,
}

impl ResourceNode {
    pub fn new(resource: impl Into<String>, purity: Purity, miner_tier: u32) -> Self {
        Self {
            resource: resource.into(),
            purity,
            miner_tier,
        }
    }

    /// Actual output given the extractor's base rate
    pub fn output_rate(&self, base_rate: f64) -> f64 {
        base_rate * self.purity.multiplier()
    }
}

impl FromStr for ResourceNode {
    type Err = ModelError;

    /// Parses `kind:purity:tier`, e.g. `Desc_OreIron_C:pure:2`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidNode(s.to_string());

        let mut parts = s.rsplitn(3, ':');
        let tier = parts.next().ok_or_else(invalid)?;
        let purity = parts.next().ok_or_else(invalid)?;
        let resource = parts.next().filter(|r| !r.is_empty()).ok_or_else(invalid)?;

        let miner_tier = tier
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|t| *t > 0)
            .ok_or_else(invalid)?;

        Ok(Self::new(resource, Purity::from_label(purity), miner_tier))
    }
}

impl fmt::Display for ResourceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.resource, self.purity, self.miner_tier)
    }
}
