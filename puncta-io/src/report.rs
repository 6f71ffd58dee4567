//! Append-only tabular results report.

use crate::error::Result;
use puncta_core::ResultsRow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Fixed report header, one column per [`ResultsRow`] field.
const HEADER: &str = "Image name\tBackground noise\tNucleus ID\tNucleus area\t\
                      Foci number\tFoci total area\tFoci bg-corr mean intensity\t\
                      Foci bg-corr raw integrated density\tDiffuse area\t\
                      Diffuse bg-corr mean intensity\tDiffuse bg-corr raw integrated density";

/// Writer for the per-nucleus results table.
///
/// Tab-separated, one row per nucleus per image, header written at
/// creation. Every row is flushed as soon as it is written so a
/// failure later in the run cannot lose completed measurements.
pub struct ReportWriter {
    writer: BufWriter<File>,
}

impl ReportWriter {
    /// Creates the report file and writes the header.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{HEADER}")?;
        writer.flush()?;
        Ok(Self { writer })
    }

    /// Appends one row and flushes it.
    pub fn write_row(&mut self, row: &ResultsRow) -> Result<()> {
        let m = &row.metrics;
        writeln!(
            self.writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            row.image_name,
            row.background,
            m.nucleus_id,
            m.nucleus_area,
            m.foci_count,
            m.foci_area,
            m.foci_mean_intensity,
            m.foci_total_intensity,
            m.diffuse_area,
            m.diffuse_mean_intensity,
            m.diffuse_total_intensity,
        )?;
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
