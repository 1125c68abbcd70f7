// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// FileMaker's own default export format for dates, as a chrono pattern.
pub const DEFAULT_DATE_FORMAT: &str = "%m/%d/%Y";
/// FileMaker's own default export format for times, as a chrono pattern.
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";

/// Options recognised by the importer.
///
/// ```yaml
/// date_format: "%d/%m/%Y"
/// time_format: "%H:%M"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportOptions {
    /// chrono `strftime` pattern for DATE cells.
    pub date_format: String,
    /// chrono `strftime` pattern for TIME cells; the flexible parser is tried after it.
    pub time_format: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }
}

impl ImportOptions {
    pub fn with_date_format(mut self, fmt: impl Into<String>) -> Self {
        self.date_format = fmt.into();
        self
    }

    pub fn with_time_format(mut self, fmt: impl Into<String>) -> Self {
        self.time_format = fmt.into();
        self
    }

    /// Pattern used for TIMESTAMP cells.
    pub fn timestamp_format(&self) -> String {
        format!("{} {}", self.date_format, self.time_format)
    }

    /// Reject patterns that can never match (empty ones).
    pub fn validate(&self) -> Result<(), String> {
        if self.date_format.trim().is_empty() {
            return Err("date_format is empty".into());
        }
        if self.time_format.trim().is_empty() {
            return Err("time_format is empty".into());
        }
        Ok(())
    }

    /// Load options from a YAML file; missing keys keep their defaults.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading options file {:?}", path))?;
        let opts: ImportOptions = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing options file {:?}", path))?;
        opts.validate().map_err(anyhow::Error::msg)?;
        Ok(opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_explicit() {
        let o = ImportOptions::default();
        assert_eq!(o.date_format, "%m/%d/%Y");
        assert_eq!(o.time_format, "%H:%M:%S");
        assert_eq!(o.timestamp_format(), "%m/%d/%Y %H:%M:%S");
    }

    #[test]
    fn test_yaml_partial_override() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "date_format: \"%d/%m/%Y\"")?;
        let o = ImportOptions::from_yaml_file(tmp.path())?;
        assert_eq!(o.date_format, "%d/%m/%Y");
        assert_eq!(o.time_format, DEFAULT_TIME_FORMAT);
        Ok(())
    }

    #[test]
    fn test_yaml_rejects_unknown_keys_and_empty_patterns() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "locale: en_AU")?;
        assert!(ImportOptions::from_yaml_file(tmp.path()).is_err());

        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "time_format: \"\"")?;
        assert!(ImportOptions::from_yaml_file(tmp.path()).is_err());
        Ok(())
    }
}
