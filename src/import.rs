//! Import of JSON catalog data into the database
//!
//! Accepts either a single catalog file or a directory tree of JSON
//! fragments (e.g. one file per game tier). Fragments are merged in file
//! name order, so recipe order, and with it the canonical recipe choice,
//! is stable between runs.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use walkdir::WalkDir;

use crate::catalog::CatalogDocument;
use crate::db;

/// Find all *.json files below `dir`, sorted by path
pub fn find_catalog_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect()
}

/// Read a file or directory into a single merged document.
///
/// Files that fail to parse are reported and counted, not fatal.
pub fn read_catalog(path: &Path, stats: &mut ImportStats) -> Result<CatalogDocument> {
    let files = if path.is_dir() {
        find_catalog_files(path)
    } else {
        vec![path.to_path_buf()]
    };

    let mut merged = CatalogDocument::default();
    for file in &files {
        match CatalogDocument::from_path(file) {
            Ok(doc) => {
                log::info!(
                    "parsed {} ({} recipes, {} buildings)",
                    file.display(),
                    doc.recipes.len(),
                    doc.buildings.len()
                );
                stats.files += 1;
                merged.merge(doc);
            }
            Err(e) if !path.is_dir() => {
                return Err(e).with_context(|| format!("Failed to import {}", path.display()));
            }
            Err(e) => {
                log::error!("{}", e);
                stats.errors += 1;
            }
        }
    }

    Ok(merged)
}

/// Import catalog data from `path` and store it in the database
pub fn import_to_database(conn: &mut Connection, path: &Path) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    log::info!("Scanning {} for catalog data...", path.display());
    let doc = read_catalog(path, &mut stats)?;

    stats.recipes = doc.recipes.len();
    stats.buildings = doc.buildings.len();
    stats.resources = doc.resources.len();
    stats.miners = doc.miners.len();

    db::save_document(conn, &doc)?;
    Ok(stats)
}

#[derive(Debug, Default)]
pub struct ImportStats {
    pub files: usize,
    pub recipes: usize,
    pub buildings: usize,
    pub resources: usize,
    pub miners: usize,
    pub errors: usize,
}

impl fmt::Display for ImportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Imported {} files: {} recipes, {} buildings, {} resources, {} miners. Errors: {}",
            self.files, self.recipes, self.buildings, self.resources, self.miners, self.errors
        )
    }
}
