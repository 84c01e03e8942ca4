//! Database schema and operations

use std::collections::HashSet;

use anyhow::Result;
use rusqlite::Connection;

use crate::catalog::{
    BuildingEntry, CatalogDocument, ItemAmount, MinerEntry, RecipeEntry, ResourceEntry,
};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Recipes in catalog order; position decides the canonical recipe
        CREATE TABLE IF NOT EXISTS recipes (
            position INTEGER PRIMARY KEY,
            key TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            time_s REAL NOT NULL,
            alternate INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS recipe_ingredients (
            recipe_key TEXT NOT NULL,
            position INTEGER NOT NULL,
            item TEXT NOT NULL,
            amount REAL NOT NULL,
            PRIMARY KEY (recipe_key, item)
        );

        CREATE TABLE IF NOT EXISTS recipe_products (
            recipe_key TEXT NOT NULL,
            position INTEGER NOT NULL,
            item TEXT NOT NULL,
            amount REAL NOT NULL,
            PRIMARY KEY (recipe_key, item)
        );

        -- Crafting buildings, keyed by the recipe category they run
        CREATE TABLE IF NOT EXISTS buildings (
            category TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            power_mw REAL NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS resources (
            key TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS miners (
            key TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            tier INTEGER NOT NULL,
            rate_per_min REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS items (
            key TEXT PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_recipe_products_item ON recipe_products(item);
        "#,
    )?;
    Ok(())
}

/// Clear all catalog data (for re-import)
pub fn clear_catalog(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM recipe_products;
        DELETE FROM recipe_ingredients;
        DELETE FROM recipes;
        DELETE FROM buildings;
        DELETE FROM resources;
        DELETE FROM miners;
        DELETE FROM items;
        "#,
    )?;
    Ok(())
}

/// Insert or replace a building
pub fn upsert_building(conn: &Connection, category: &str, building: &BuildingEntry) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO buildings (category, name, power_mw) VALUES (?1, ?2, ?3)",
        (category, &building.name, building.power),
    )?;
    Ok(())
}

/// Insert or replace a recipe, appending it to the end of the catalog order.
///
/// An item listed twice on the same side of the recipe is an error.
pub fn insert_recipe(conn: &Connection, recipe: &RecipeEntry) -> Result<()> {
    conn.execute(
        "DELETE FROM recipe_ingredients WHERE recipe_key = ?1",
        [&recipe.key],
    )?;
    conn.execute("DELETE FROM recipe_products WHERE recipe_key = ?1", [&recipe.key])?;
    conn.execute("DELETE FROM recipes WHERE key = ?1", [&recipe.key])?;

    conn.execute(
        "INSERT INTO recipes (key, name, category, time_s, alternate) VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            &recipe.key,
            &recipe.name,
            &recipe.category,
            recipe.time,
            recipe.alternate,
        ),
    )?;

    for (i, ingredient) in recipe.ingredients.iter().enumerate() {
        conn.execute(
            "INSERT INTO recipe_ingredients (recipe_key, position, item, amount)
             VALUES (?1, ?2, ?3, ?4)",
            (&recipe.key, i as i64, &ingredient.item, ingredient.amount),
        )?;
    }
    for (i, product) in recipe.products.iter().enumerate() {
        conn.execute(
            "INSERT INTO recipe_products (recipe_key, position, item, amount)
             VALUES (?1, ?2, ?3, ?4)",
            (&recipe.key, i as i64, &product.item, product.amount),
        )?;
    }
    Ok(())
}

/// Write a whole catalog document in one transaction.
///
/// Recipes go through the same rules as [`crate::Catalog::from_document`]:
/// invalid recipes are skipped and the first recipe with a given key wins,
/// so the stored catalog selects the same canonical recipes.
pub fn save_document(conn: &mut Connection, doc: &CatalogDocument) -> Result<()> {
    let tx = conn.transaction()?;

    let mut seen = HashSet::new();
    for recipe in &doc.recipes {
        if let Err(e) = recipe.to_recipe() {
            log::warn!("not storing recipe: {}", e);
            continue;
        }
        if !seen.insert(recipe.key.as_str()) {
            log::warn!("duplicate recipe key '{}', keeping the first", recipe.key);
            continue;
        }
        insert_recipe(&tx, recipe)?;
    }
    for (category, building) in &doc.buildings {
        upsert_building(&tx, category, building)?;
    }
    for (key, resource) in &doc.resources {
        tx.execute(
            "INSERT OR REPLACE INTO resources (key, name, category) VALUES (?1, ?2, ?3)",
            (key, &resource.name, &resource.category),
        )?;
    }
    for (key, miner) in &doc.miners {
        tx.execute(
            "INSERT OR REPLACE INTO miners (key, name, category, tier, rate_per_min)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            (key, &miner.name, &miner.category, miner.tier, miner.rate),
        )?;
    }
    for (key, name) in &doc.items {
        tx.execute(
            "INSERT OR REPLACE INTO items (key, name) VALUES (?1, ?2)",
            (key, name),
        )?;
    }

    tx.commit()?;
    Ok(())
}

/// Read the stored catalog back, recipes in catalog order
pub fn load_document(conn: &Connection) -> Result<CatalogDocument> {
    let mut doc = CatalogDocument::default();

    let mut stmt = conn.prepare(
        "SELECT key, name, category, time_s, alternate FROM recipes ORDER BY position",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(RecipeEntry {
            key: row.get(0)?,
            name: row.get(1)?,
            category: row.get(2)?,
            time: row.get(3)?,
            alternate: row.get(4)?,
            ingredients: Vec::new(),
            products: Vec::new(),
        })
    })?;
    for row in rows {
        let mut recipe = row?;
        recipe.ingredients = recipe_amounts(conn, "recipe_ingredients", &recipe.key)?;
        recipe.products = recipe_amounts(conn, "recipe_products", &recipe.key)?;
        doc.recipes.push(recipe);
    }

    let mut stmt = conn.prepare("SELECT category, name, power_mw FROM buildings")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            BuildingEntry {
                name: row.get(1)?,
                power: row.get(2)?,
            },
        ))
    })?;
    for row in rows {
        let (category, building) = row?;
        doc.buildings.insert(category, building);
    }

    let mut stmt = conn.prepare("SELECT key, name, category FROM resources")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            ResourceEntry {
                name: row.get(1)?,
                category: row.get(2)?,
            },
        ))
    })?;
    for row in rows {
        let (key, resource) = row?;
        doc.resources.insert(key, resource);
    }

    let mut stmt = conn.prepare("SELECT key, name, category, tier, rate_per_min FROM miners")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            MinerEntry {
                name: row.get(1)?,
                category: row.get(2)?,
                tier: row.get(3)?,
                rate: row.get(4)?,
            },
        ))
    })?;
    for row in rows {
        let (key, miner) = row?;
        doc.miners.insert(key, miner);
    }

    let mut stmt = conn.prepare("SELECT key, name FROM items")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
    for row in rows {
        let (key, name) = row?;
        doc.items.insert(key, name);
    }

    Ok(doc)
}

fn recipe_amounts(conn: &Connection, table: &str, recipe_key: &str) -> Result<Vec<ItemAmount>> {
    // table is one of two fixed names, never user input
    let mut stmt = conn.prepare(&format!(
        "SELECT item, amount FROM {} WHERE recipe_key = ?1 ORDER BY position",
        table
    ))?;
    let rows = stmt.query_map([recipe_key], |row| {
        Ok(ItemAmount {
            item: row.get(0)?,
            amount: row.get(1)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Number of stored recipes
pub fn recipe_count(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))?;
    Ok(count as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, RecipePolicy};

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn sample_doc() -> CatalogDocument {
        CatalogDocument::from_json_str(
            r#"{
            "recipes": [
                {"key": "Recipe_Screw_C", "name": "Screw", "category": "constructor", "time": 6,
                 "ingredients": [{"item": "iron-rod", "amount": 1}],
                 "products": [{"item": "screw", "amount": 4}]},
                {"key": "Recipe_Alternate_Screw_C", "name": "Alternate: Cast Screw", "category": "constructor",
                 "time": 24, "alternate": true,
                 "ingredients": [{"item": "iron-ingot", "amount": 5}],
                 "products": [{"item": "screw", "amount": 20}]},
                {"key": "Recipe_Motor_C", "name": "Motor", "category": "assembler", "time": 12,
                 "ingredients": [{"item": "rotor", "amount": 2}, {"item": "stator", "amount": 2}],
                 "products": [{"item": "motor", "amount": 1}]}
            ],
            "buildings": {"constructor": {"name": "Constructor", "power": 4}},
            "resources": {"iron-ore": {"name": "Iron Ore", "category": "solid"}},
            "miners": {"Build_MinerMk1_C": {"name": "Miner Mk.1", "category": "solid", "tier": 1, "rate": 60}},
            "items": {"screw": "Screw"}
        }"#,
        )
        .unwrap()
    }

    #[test]
    fn document_round_trip_keeps_order() {
        let mut conn = open();
        let doc = sample_doc();
        save_document(&mut conn, &doc).unwrap();

        let loaded = load_document(&conn).unwrap();
        assert_eq!(loaded, doc);
        assert_eq!(recipe_count(&conn).unwrap(), 3);
    }

    #[test]
    fn reinserting_a_recipe_replaces_it() {
        let conn = open();
        let doc = sample_doc();
        insert_recipe(&conn, &doc.recipes[0]).unwrap();
        insert_recipe(&conn, &doc.recipes[0]).unwrap();
        assert_eq!(recipe_count(&conn).unwrap(), 1);
        assert_eq!(load_document(&conn).unwrap().recipes[0].ingredients.len(), 1);
    }

    #[test]
    fn duplicate_item_rows_are_an_error() {
        let conn = open();
        let mut recipe = sample_doc().recipes[2].clone();
        recipe.ingredients.push(ItemAmount {
            item: "rotor".to_string(),
            amount: 5.0,
        });
        assert!(insert_recipe(&conn, &recipe).is_err());
    }

    #[test]
    fn stored_catalog_picks_the_same_recipes_as_json() {
        let doc = CatalogDocument::from_json_str(
            r#"{"recipes": [
                {"key": "K", "name": "First", "category": "c", "time": 1,
                 "products": [{"item": "x", "amount": 1}]},
                {"key": "K2", "name": "Second", "category": "c", "time": 1,
                 "products": [{"item": "x", "amount": 1}]},
                {"key": "K", "name": "Shadowed", "category": "c", "time": 1,
                 "products": [{"item": "y", "amount": 1}]},
                {"key": "D", "name": "Doubled", "category": "c", "time": 1,
                 "ingredients": [{"item": "a", "amount": 1}, {"item": "a", "amount": 5}],
                 "products": [{"item": "z", "amount": 1}]}
            ]}"#,
        )
        .unwrap();
        let policy = RecipePolicy::default();
        let direct = Catalog::from_document(&doc, &policy);

        let mut conn = open();
        save_document(&mut conn, &doc).unwrap();
        let stored = Catalog::from_document(&load_document(&conn).unwrap(), &policy);

        for item in ["x", "y", "z"] {
            assert_eq!(
                direct.recipe_for(item).map(|r| &r.key),
                stored.recipe_for(item).map(|r| &r.key),
                "canonical recipe for {}",
                item
            );
        }
        assert_eq!(stored.recipe_for("x").unwrap().key, "K");
        assert!(stored.recipe_for("y").is_none());
        assert!(stored.recipe("D").is_none());
        assert_eq!(recipe_count(&conn).unwrap(), 2);
    }

    #[test]
    fn clear_removes_everything() {
        let mut conn = open();
        save_document(&mut conn, &sample_doc()).unwrap();
        clear_catalog(&conn).unwrap();
        assert!(load_document(&conn).unwrap().is_empty());
        assert_eq!(recipe_count(&conn).unwrap(), 0);
    }
}
