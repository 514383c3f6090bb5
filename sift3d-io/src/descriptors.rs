//! Delimited-text descriptor files
//!
//! One row per descriptor: `x`, `y`, `z`, `scale`, then the histogram values,
//! in the order the descriptors were extracted.

use serde::{Deserialize, Serialize};
use sift3d_core::{Descriptor, DescriptorStore, DescriptorWriter, Error, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Supported field delimiters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    #[default]
    Comma,
    Space,
    Tab,
    Semicolon,
}

impl Delimiter {
    /// Get the character representation of the delimiter
    pub fn as_char(&self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Space => ' ',
            Delimiter::Tab => '\t',
            Delimiter::Semicolon => ';',
        }
    }
}

/// Write options for descriptor files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DescriptorWriteOptions {
    pub delimiter: Delimiter,
    pub include_header: bool,
}

impl DescriptorWriteOptions {
    /// Comma separated with a header row
    pub fn csv_with_header() -> Self {
        Self {
            delimiter: Delimiter::Comma,
            include_header: true,
        }
    }

    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// Descriptor file writer
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorCsvWriter {
    pub options: DescriptorWriteOptions,
}

impl DescriptorCsvWriter {
    pub fn new(options: DescriptorWriteOptions) -> Self {
        Self { options }
    }

    fn write_to<W: Write>(&self, out: &mut W, descriptors: &DescriptorStore) -> Result<()> {
        let sep = self.options.delimiter.as_char().to_string();

        if self.options.include_header {
            let dimension = descriptors.dimension().unwrap_or(0);
            let mut header: Vec<String> = ["x", "y", "z", "scale"]
                .iter()
                .map(|s| s.to_string())
                .collect();
            header.extend((0..dimension).map(|i| format!("d{}", i)));
            writeln!(out, "{}", header.join(&sep))?;
        }

        for descriptor in descriptors {
            writeln!(out, "{}", Self::format_row(descriptor, &sep))?;
        }
        Ok(())
    }

    fn format_row(descriptor: &Descriptor, sep: &str) -> String {
        let mut values = vec![
            descriptor.position.x.to_string(),
            descriptor.position.y.to_string(),
            descriptor.position.z.to_string(),
            descriptor.scale.to_string(),
        ];
        values.extend(descriptor.histogram.iter().map(|v| v.to_string()));
        values.join(sep)
    }
}

impl DescriptorWriter for DescriptorCsvWriter {
    fn write_descriptors(&self, path: &Path, descriptors: &DescriptorStore) -> Result<()> {
        if !descriptors.is_empty() && descriptors.dimension().is_none() {
            return Err(Error::InvalidData(
                "descriptors have differing histogram lengths".to_string(),
            ));
        }

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let result = self
            .write_to(&mut writer, descriptors)
            .and_then(|()| writer.flush().map_err(Error::from));

        if let Err(e) = result {
            drop(writer);
            if let Err(cleanup) = fs::remove_file(path) {
                warn!("Could not remove partial output {}: {}", path.display(), cleanup);
            }
            return Err(e);
        }

        debug!("Wrote {} descriptors to {}", descriptors.len(), path.display());
        Ok(())
    }

    fn format_name(&self) -> &'static str {
        "descriptor_csv"
    }
}
