//! Built-in sample catalog covering the early iron and copper tiers

use crate::catalog::{
    BuildingEntry, CatalogDocument, ItemAmount, MinerEntry, RecipeEntry, ResourceEntry,
};

fn amounts(list: &[(&str, f64)]) -> Vec<ItemAmount> {
    list.iter()
        .map(|(item, amount)| ItemAmount {
            item: item.to_string(),
            amount: *amount,
        })
        .collect()
}

fn recipe(
    key: &str,
    name: &str,
    category: &str,
    time: f64,
    ingredients: &[(&str, f64)],
    products: &[(&str, f64)],
) -> RecipeEntry {
    RecipeEntry {
        key: key.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        time,
        ingredients: amounts(ingredients),
        products: amounts(products),
        alternate: false,
    }
}

/// Sample data for trying the calculator without a game data export
pub fn sample_document() -> CatalogDocument {
    let mut doc = CatalogDocument::default();

    doc.recipes = vec![
        recipe(
            "Recipe_IngotIron_C",
            "Iron Ingot",
            "smelter",
            2.0,
            &[("Desc_OreIron_C", 1.0)],
            &[("Desc_IronIngot_C", 1.0)],
        ),
        recipe(
            "Recipe_IngotCopper_C",
            "Copper Ingot",
            "smelter",
            2.0,
            &[("Desc_OreCopper_C", 1.0)],
            &[("Desc_CopperIngot_C", 1.0)],
        ),
        recipe(
            "Recipe_IronPlate_C",
            "Iron Plate",
            "constructor",
            6.0,
            &[("Desc_IronIngot_C", 3.0)],
            &[("Desc_IronPlate_C", 2.0)],
        ),
        recipe(
            "Recipe_IronRod_C",
            "Iron Rod",
            "constructor",
            4.0,
            &[("Desc_IronIngot_C", 1.0)],
            &[("Desc_IronRod_C", 1.0)],
        ),
        recipe(
            "Recipe_Screw_C",
            "Screw",
            "constructor",
            6.0,
            &[("Desc_IronRod_C", 1.0)],
            &[("Desc_IronScrew_C", 4.0)],
        ),
        recipe(
            "Recipe_Wire_C",
            "Wire",
            "constructor",
            4.0,
            &[("Desc_CopperIngot_C", 1.0)],
            &[("Desc_Wire_C", 2.0)],
        ),
        recipe(
            "Recipe_Cable_C",
            "Cable",
            "constructor",
            2.0,
            &[("Desc_Wire_C", 2.0)],
            &[("Desc_Cable_C", 1.0)],
        ),
        recipe(
            "Recipe_Concrete_C",
            "Concrete",
            "constructor",
            4.0,
            &[("Desc_Stone_C", 3.0)],
            &[("Desc_Cement_C", 1.0)],
        ),
        recipe(
            "Recipe_IronPlateReinforced_C",
            "Reinforced Iron Plate",
            "assembler",
            12.0,
            &[("Desc_IronPlate_C", 6.0), ("Desc_IronScrew_C", 12.0)],
            &[("Desc_IronPlateReinforced_C", 1.0)],
        ),
        recipe(
            "Recipe_Rotor_C",
            "Rotor",
            "assembler",
            15.0,
            &[("Desc_IronRod_C", 5.0), ("Desc_IronScrew_C", 25.0)],
            &[("Desc_Rotor_C", 1.0)],
        ),
        recipe(
            "Recipe_ModularFrame_C",
            "Modular Frame",
            "assembler",
            60.0,
            &[("Desc_IronPlateReinforced_C", 3.0), ("Desc_IronRod_C", 12.0)],
            &[("Desc_ModularFrame_C", 2.0)],
        ),
        RecipeEntry {
            alternate: true,
            ..recipe(
                "Recipe_Alternate_Screw_C",
                "Alternate: Cast Screw",
                "constructor",
                24.0,
                &[("Desc_IronIngot_C", 5.0)],
                &[("Desc_IronScrew_C", 20.0)],
            )
        },
    ];

    for (category, name, power) in [
        ("smelter", "Smelter", 4.0),
        ("constructor", "Constructor", 4.0),
        ("assembler", "Assembler", 15.0),
    ] {
        doc.buildings.insert(
            category.to_string(),
            BuildingEntry {
                name: name.to_string(),
                power,
            },
        );
    }

    for (key, name) in [
        ("Desc_OreIron_C", "Iron Ore"),
        ("Desc_OreCopper_C", "Copper Ore"),
        ("Desc_Stone_C", "Limestone"),
    ] {
        doc.resources.insert(
            key.to_string(),
            ResourceEntry {
                name: name.to_string(),
                category: "solid".to_string(),
            },
        );
    }

    for (key, name, tier, rate) in [
        ("Build_MinerMk1_C", "Miner Mk.1", 1, 60.0),
        ("Build_MinerMk2_C", "Miner Mk.2", 2, 120.0),
        ("Build_MinerMk3_C", "Miner Mk.3", 3, 240.0),
    ] {
        doc.miners.insert(
            key.to_string(),
            MinerEntry {
                name: name.to_string(),
                category: "solid".to_string(),
                tier,
                rate,
            },
        );
    }

    for (key, name) in [
        ("Desc_IronIngot_C", "Iron Ingot"),
        ("Desc_CopperIngot_C", "Copper Ingot"),
        ("Desc_IronPlate_C", "Iron Plate"),
        ("Desc_IronRod_C", "Iron Rod"),
        ("Desc_IronScrew_C", "Screw"),
        ("Desc_Wire_C", "Wire"),
        ("Desc_Cable_C", "Cable"),
        ("Desc_Cement_C", "Concrete"),
        ("Desc_IronPlateReinforced_C", "Reinforced Iron Plate"),
        ("Desc_Rotor_C", "Rotor"),
        ("Desc_ModularFrame_C", "Modular Frame"),
    ] {
        doc.items.insert(key.to_string(), name.to_string());
    }

    doc
}
