//! Satisfactory Production Calculator
//!
//! A production chain calculator for Satisfactory.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;

use satisfactory_calculator::catalog::{Catalog, RecipePolicy};
use satisfactory_calculator::models::ResourceNode;
use satisfactory_calculator::report::{self, AvailabilityTable};
use satisfactory_calculator::{calculator, db, import, sample};

#[derive(Parser)]
#[command(name = "satisfactory-calculator")]
#[command(about = "Production chain calculator for Satisfactory")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, default_value = "satisfactory.db")]
    database: PathBuf,

    /// Read the catalog from a JSON file instead of the database
    #[arg(short, long, global = true)]
    catalog: Option<PathBuf>,

    /// Let alternate recipes be picked as the canonical recipe
    #[arg(long, global = true)]
    allow_alternates: bool,

    /// Never pick recipes whose key or name matches this regex (repeatable)
    #[arg(long, global = true)]
    exclude: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import catalog JSON (a file or a directory of fragments) into the database
    Import {
        /// Catalog file or directory
        source: PathBuf,

        /// Clear existing data before import
        #[arg(long)]
        clear: bool,
    },

    /// Calculate production chain for a target item
    Calc {
        /// Target item key (e.g., "Desc_IronPlate_C")
        item: String,

        /// Target production rate in items per minute
        #[arg(short, long, default_value = "60.0")]
        rate: f64,

        /// Show detailed production tree
        #[arg(short, long)]
        verbose: bool,

        /// Resource node as kind:purity:tier, e.g. Desc_OreIron_C:pure:2 (repeatable)
        #[arg(short, long = "node")]
        nodes: Vec<ResourceNode>,

        /// Write the recipes used to a CSV file
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// List all recipes in catalog order
    ListRecipes,

    /// List all buildings
    ListBuildings,

    /// List all producible items
    ListItems,

    /// Show details for a specific recipe
    Recipe {
        /// Recipe key
        key: String,
    },

    /// Initialize empty database with schema
    Init,

    /// Load sample data for testing (without a game data export)
    LoadSample,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let mut policy = RecipePolicy::default().allow_alternates(cli.allow_alternates);
    for pattern in &cli.exclude {
        policy = policy.exclude(pattern)?;
    }

    let load = || load_catalog(cli.catalog.as_deref(), &cli.database, &policy);

    match &cli.command {
        Commands::Import { source, clear } => {
            let mut conn = open_database(&cli.database)?;
            if *clear {
                println!("Clearing existing data...");
                db::clear_catalog(&conn)?;
            }

            let stats = import::import_to_database(&mut conn, source)?;
            println!("{}", stats);
            println!("Database now holds {} recipes", db::recipe_count(&conn)?);
        }

        Commands::Calc {
            item,
            rate,
            verbose,
            nodes,
            export,
        } => {
            let catalog = load()?;
            for rejected in catalog.rejected() {
                eprintln!("warning: {}", rejected);
            }

            let nodes = (!nodes.is_empty()).then_some(nodes.as_slice());
            let calc = calculator::calculate(&catalog, item, *rate, nodes);

            if *verbose {
                println!("Production chain:\n");
                println!("{}", report::format_production_tree(&calc.resolution.tree));
            }

            println!("{}", calc.resolution);

            if let Some(availability) = &calc.availability {
                println!("Resource nodes:");
                for node in nodes.unwrap_or_default() {
                    let extractor = catalog
                        .extractor(&node.resource, node.miner_tier)
                        .map_or("default extractor", |m| m.name.as_str());
                    let base = catalog.base_extraction_rate(&node.resource, node.miner_tier);
                    println!("  {:<36} {:<20} {:>8.1}/min", node, extractor, node.output_rate(base));
                }
                println!();
                println!("Resource availability:");
                println!("{}", AvailabilityTable(availability));
            }

            if let Some(path) = export {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                report::write_recipes_csv(&calc.resolution, BufWriter::new(file))?;
                println!("Recipes written to {}", path.display());
            }
        }

        Commands::ListRecipes => {
            let catalog = load()?;
            if catalog.recipes().is_empty() {
                println!("No recipes in catalog. Run 'import' or 'load-sample' first.");
            } else {
                println!("{:<40} {:<16} {:>8}", "Recipe", "Category", "Time (s)");
                println!("{}", "-".repeat(66));
                for r in catalog.recipes() {
                    let marker = if r.alternate { " (alt)" } else { "" };
                    println!("{:<40} {:<16} {:>8.1}{}", r.name, r.category, r.time(), marker);
                }
            }
        }

        Commands::ListBuildings => {
            let catalog = load()?;
            let mut buildings: Vec<_> = catalog.buildings().collect();
            buildings.sort_by(|a, b| a.name.cmp(&b.name));
            if buildings.is_empty() {
                println!("No buildings in catalog. Run 'import' or 'load-sample' first.");
            } else {
                println!("{:<30} {:<16} {:>10}", "Building", "Category", "Power (MW)");
                println!("{}", "-".repeat(58));
                for b in buildings {
                    println!("{:<30} {:<16} {:>10.1}", b.name, b.category, b.power_mw);
                }
            }
        }

        Commands::ListItems => {
            let catalog = load()?;
            let items = catalog.producible_items();
            if items.is_empty() {
                println!("No items in catalog. Run 'import' or 'load-sample' first.");
            } else {
                println!("Producible items:");
                for item in items {
                    println!("  {:<36} {}", item, catalog.item_name(item));
                }
            }
        }

        Commands::Recipe { key } => {
            let catalog = load()?;
            if let Some(r) = catalog.recipe(key) {
                println!("Recipe: {}", r.name);
                println!("  Key: {}", r.key);
                println!("  Category: {}", r.category);
                if let Some(b) = catalog.building_for(&r.category) {
                    println!("  Building: {} ({} MW)", b.name, b.power_mw);
                }
                println!("  Time: {}s", r.time());

                if !r.ingredients().is_empty() {
                    println!("  Inputs:");
                    for (item, rate) in r.ingredients_per_minute() {
                        println!("    {} @ {:.2}/min", catalog.item_name(&item), rate);
                    }
                }
                println!("  Outputs:");
                for (item, rate) in r.products_per_minute() {
                    let canonical = catalog
                        .recipe_for(&item)
                        .is_some_and(|c| c.key == r.key);
                    let marker = if canonical { "" } else { " (not canonical)" };
                    println!("    {} @ {:.2}/min{}", catalog.item_name(&item), rate, marker);
                }
            } else {
                println!("Recipe '{}' not found", key);
            }
        }

        Commands::Init => {
            open_database(&cli.database)?;
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::LoadSample => {
            let mut conn = open_database(&cli.database)?;
            db::clear_catalog(&conn)?;
            let doc = sample::sample_document();
            db::save_document(&mut conn, &doc)?;
            println!("Loaded {} sample recipes", doc.recipes.len());
        }
    }

    Ok(())
}

/// Open the database, creating the schema if needed
fn open_database(path: &Path) -> Result<Connection> {
    let conn =
        Connection::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    db::init_schema(&conn)?;
    Ok(conn)
}

/// Read the catalog from the JSON file when one is given, otherwise from the
/// database. The database is only opened in the second case.
fn load_catalog(json: Option<&Path>, database: &Path, policy: &RecipePolicy) -> Result<Catalog> {
    match json {
        Some(path) => Ok(Catalog::load_or_empty(path, policy)),
        None => {
            let conn = open_database(database)?;
            Ok(Catalog::from_document(&db::load_document(&conn)?, policy))
        }
    }
}
