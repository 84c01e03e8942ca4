//! Satisfactory Production Calculator
//!
//! Resolves the full chain of recipes, buildings and raw materials needed
//! to sustain a target output rate, and checks raw material demand against
//! the resource nodes a player has tapped.

pub mod availability;
pub mod calculator;
pub mod catalog;
pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod report;
pub mod sample;

pub use availability::{match_resources, Availability, AvailabilityReport};
pub use calculator::{calculate, resolve, Calculation, NodeKind, ProductionNode, Resolution, Warning};
pub use catalog::{Catalog, CatalogDocument, RecipePolicy};
pub use models::{Purity, Recipe, ResourceNode};
