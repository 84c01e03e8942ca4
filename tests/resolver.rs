use std::thread;

use proptest::prelude::*;

use satisfactory_calculator::catalog::{CatalogDocument, ItemAmount, RecipeEntry};
use satisfactory_calculator::sample::sample_document;
use satisfactory_calculator::{
    calculate, resolve, Catalog, Purity, RecipePolicy, ResourceNode, Warning,
};

fn entry(key: &str, time: f64, ingredients: &[(&str, f64)], products: &[(&str, f64)]) -> RecipeEntry {
    let amounts = |list: &[(&str, f64)]| -> Vec<ItemAmount> {
        list.iter()
            .map(|(item, amount)| ItemAmount {
                item: item.to_string(),
                amount: *amount,
            })
            .collect()
    };
    RecipeEntry {
        key: key.to_string(),
        name: key.to_string(),
        category: "constructor".to_string(),
        time,
        ingredients: amounts(ingredients),
        products: amounts(products),
        alternate: false,
    }
}

fn catalog_of(recipes: Vec<RecipeEntry>) -> Catalog {
    let doc = CatalogDocument {
        recipes,
        ..Default::default()
    };
    Catalog::from_document(&doc, &RecipePolicy::default())
}

/// item-0 <- item-1 <- ... <- item-n, each step 1:1 at one cycle per minute
fn chain(n: usize) -> Vec<RecipeEntry> {
    (0..n)
        .map(|i| {
            let out = format!("item-{}", i);
            let input = format!("item-{}", i + 1);
            entry(&out, 60.0, &[(&input, 1.0)], &[(&out, 1.0)])
        })
        .collect()
}

fn sample_catalog() -> Catalog {
    Catalog::from_document(&sample_document(), &RecipePolicy::default())
}

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-6 * b.abs().max(1.0), "{} != {}", a, b);
}

#[test]
fn linear_chain_raw_rate_follows_building_counts() {
    // A needs 2 B per 3 A (3 A/min per building), B needs 5 C per B
    let catalog = catalog_of(vec![
        entry("A", 20.0, &[("B", 2.0)], &[("A", 1.0)]),
        entry("B", 10.0, &[("C", 5.0)], &[("B", 1.0)]),
    ]);
    let res = resolve(&catalog, "A", 9.0);

    assert!(res.warnings.is_empty());
    // 9 A/min -> 3 buildings -> 18 B/min -> 3 buildings -> 90 C/min
    assert_close(res.recipes_used["A"].buildings, 3.0);
    assert_close(res.recipes_used["B"].buildings, 3.0);
    assert_close(res.raw_materials["C"], 90.0);
    assert_eq!(res.raw_materials.len(), 1);
}

#[test]
fn cycle_fifty_deep_is_detected_once() {
    let mut recipes = chain(50);
    // close the loop: item-49 now consumes item-0
    recipes[49] = entry("item-49", 60.0, &[("item-0", 1.0)], &[("item-49", 1.0)]);
    let catalog = catalog_of(recipes);

    let res = resolve(&catalog, "item-0", 1.0);

    assert_eq!(res.tree.iter().filter(|n| n.is_cycle()).count(), 1);
    assert_eq!(res.warnings.len(), 1);
    let Warning::CircularDependency { path } = &res.warnings[0] else {
        panic!("expected a cycle warning, got {:?}", res.warnings[0]);
    };
    assert_eq!(path.len(), 51);
    assert_eq!(path.first().map(String::as_str), Some("item-0"));
    assert_eq!(path.last().map(String::as_str), Some("item-0"));
    assert!(res.warnings[0].to_string().starts_with("circular dependency: item-0 → item-1 → "));
    assert_close(res.raw_materials["item-0"], 1.0);
}

#[test]
fn very_deep_chain_does_not_overflow_the_stack() {
    // a small stack, far too shallow for 10 000 levels of native recursion
    let handle = thread::Builder::new()
        .stack_size(512 * 1024)
        .spawn(|| {
            let catalog = catalog_of(chain(10_000));
            let res = resolve(&catalog, "item-0", 5.0);
            assert!(res.warnings.is_empty());
            assert_eq!(res.recipes_used.len(), 10_000);
            assert_close(res.raw_materials["item-10000"], 5.0);
            assert_eq!(res.tree.iter().count(), 10_001);

            let again = resolve(&catalog, "item-0", 5.0);
            assert_eq!(res, again);
            let copy = res.clone();
            assert_eq!(copy.tree.iter().count(), 10_001);
            assert_eq!(copy, res);
            assert!(!format!("{:?}", copy.tree).is_empty());
        })
        .unwrap();
    handle.join().unwrap();
}

#[test]
fn shared_downstream_material_accumulates_from_both_branches() {
    let catalog = sample_catalog();
    let res = resolve(&catalog, "Desc_IronPlateReinforced_C", 5.0);

    assert!(res.is_complete());
    assert_eq!(res.tree.iter().filter(|n| n.is_cycle()).count(), 0);
    // plates: 45 ingots/min, screws via rods: 15 ingots/min
    assert_close(res.raw_materials["Desc_OreIron_C"], 60.0);
    assert_close(res.recipes_used["Iron Ingot"].buildings, 2.0);
    assert_close(res.buildings_needed["Smelter"], 2.0);
}

#[test]
fn unknown_target_is_a_single_raw_leaf() {
    let res = resolve(&sample_catalog(), "Desc_Unobtainium_C", 12.0);
    assert!(res.tree.is_raw());
    assert!(res.tree.children.is_empty());
    assert_eq!(res.raw_materials.len(), 1);
    assert_close(res.raw_materials["Desc_Unobtainium_C"], 12.0);
    assert!(!res.warnings.is_empty());
}

#[test]
fn availability_against_sample_miners() {
    let catalog = sample_catalog();
    let nodes = [
        ResourceNode::new("Desc_OreIron_C", Purity::Pure, 1),
        ResourceNode::new("Desc_OreIron_C", Purity::Impure, 2),
    ];
    // 20 plates/min -> 30 ore/min; supply 120 + 60
    let calc = calculate(&catalog, "Desc_IronPlate_C", 20.0, Some(&nodes));
    let report = calc.availability.unwrap();
    let iron = &report["Desc_OreIron_C"];
    assert_close(iron.available, 180.0);
    assert_eq!(iron.shortage, 0.0);
    assert_close(iron.utilization_pct, 100.0 / 6.0);
}

#[test]
fn catalog_is_shared_across_threads() {
    let catalog = sample_catalog();
    let expected = resolve(&catalog, "Desc_ModularFrame_C", 4.0);

    thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| resolve(&catalog, "Desc_ModularFrame_C", 4.0)))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

proptest! {
    #[test]
    fn raw_materials_scale_linearly_with_rate(rate in 0.1f64..10_000.0) {
        let catalog = sample_catalog();
        let unit = resolve(&catalog, "Desc_ModularFrame_C", 1.0);
        let scaled = resolve(&catalog, "Desc_ModularFrame_C", rate);

        prop_assert_eq!(unit.raw_materials.len(), scaled.raw_materials.len());
        for (item, base) in &unit.raw_materials {
            let got = scaled.raw_materials[item];
            prop_assert!((got - base * rate).abs() <= 1e-9 * (base * rate).max(1.0));
        }
        prop_assert!((scaled.power_mw - unit.power_mw * rate).abs() <= 1e-9 * (unit.power_mw * rate).max(1.0));
    }

    #[test]
    fn resolution_is_idempotent(rate in 0.1f64..1_000.0) {
        let catalog = sample_catalog();
        prop_assert_eq!(
            resolve(&catalog, "Desc_Rotor_C", rate),
            resolve(&catalog, "Desc_Rotor_C", rate)
        );
    }
}
