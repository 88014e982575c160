//! Atomic table writer.
//!
//! All four tables are written to a staging directory first; only after
//! every table has been fully written is the staging directory swapped
//! into place. Consumers therefore see either the previous run's tables
//! or the new run's, never a mix.
//!
//! Output is NDJSON with rows in deterministic order, so identical
//! inputs produce byte-identical tables.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use engine_core::{EngineTables, Result};
use serde::Serialize;
use tracing::info;

/// Table directory name inside the output directory.
const TABLES_DIR: &str = "tables";
/// Staging directory name used during the swap.
const STAGING_DIR: &str = ".staging";
/// Displaced previous tables, removed after a successful swap.
const PREVIOUS_DIR: &str = ".previous";

/// Writer for the four derived tables.
pub struct TableWriter {
    output_dir: PathBuf,
}

impl TableWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Final location of the tables directory.
    pub fn tables_dir(&self) -> PathBuf {
        self.output_dir.join(TABLES_DIR)
    }

    /// Write all four tables and swap them into place as a unit.
    pub fn write_atomic(&self, tables: &EngineTables) -> Result<()> {
        let staging = self.output_dir.join(STAGING_DIR);
        let previous = self.output_dir.join(PREVIOUS_DIR);
        let finals = self.tables_dir();

        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        write_table(&staging.join("identity_map.ndjson"), &tables.identity_map)?;
        write_table(&staging.join("sessions.ndjson"), &tables.sessions)?;
        write_table(&staging.join("attribution.ndjson"), &tables.attribution)?;
        write_table(&staging.join("order_lines.ndjson"), &tables.order_lines)?;

        // Swap: displace the old tables, promote staging, drop the old.
        if previous.exists() {
            fs::remove_dir_all(&previous)?;
        }
        if finals.exists() {
            fs::rename(&finals, &previous)?;
        }
        fs::rename(&staging, &finals)?;
        if previous.exists() {
            fs::remove_dir_all(&previous)?;
        }

        info!(
            identity_map = tables.identity_map.len(),
            sessions = tables.sessions.len(),
            attribution = tables.attribution.len(),
            order_lines = tables.order_lines.len(),
            dir = %finals.display(),
            "Tables written"
        );
        Ok(())
    }
}

/// Write one table as NDJSON.
fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    for row in rows {
        serde_json::to_writer(&mut writer, row)?;
        writer.write_all(b"\n")?;
    }

    writer.flush()?;
    Ok(())
}
