// Run configuration: an optional JSON settings file overlaid by CLI flags.
use crate::classifier::{default_rules, ClassificationRule, UnrecognizedPolicy};
use crate::error::Result;
use crate::schema::SchemaProfile;
use crate::types::Metric;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "luminaria-report",
    about = "Per-category, per-year summaries of a luminaire asset register."
)]
pub struct Cli {
    /// CSV or XLSX export to process
    #[arg(long, default_value = "base_capital_luminarias.csv")]
    pub input: PathBuf,
    /// JSON settings file (column names, classification rules, profile)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Required-column profile; overrides the settings file
    #[arg(long, value_enum)]
    pub profile: Option<SchemaProfile>,
    /// What to do with non-empty labels no rule recognizes
    #[arg(long = "on-unrecognized", value_enum)]
    pub on_unrecognized: Option<UnrecognizedPolicy>,
    /// Metric used for the cross-category comparison
    #[arg(long, value_enum, default_value = "acquisition")]
    pub metric: Metric,
    /// Directory the report files are written to
    #[arg(long = "out-dir", default_value = ".")]
    pub out_dir: PathBuf,
    /// Run load, summaries and comparison once without the menu
    #[arg(long)]
    pub batch: bool,
}

/// Header names of the fields the engine reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub asset_id: String,
    pub label: String,
    pub year: String,
    pub acquisition: String,
    pub amortization: String,
    pub book_value: String,
    pub quantity: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        ColumnNames {
            asset_id: "Activo fijo".to_string(),
            label: "Descripción SG".to_string(),
            year: "AÑO DE ACTIVACIÓN".to_string(),
            acquisition: "Val.adq.".to_string(),
            amortization: "Amo acum.".to_string(),
            book_value: "Val.cont.".to_string(),
            quantity: "Cantidad".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub columns: ColumnNames,
    #[serde(default = "default_rules")]
    pub rules: Vec<ClassificationRule>,
    #[serde(default)]
    pub profile: SchemaProfile,
    #[serde(default)]
    pub on_unrecognized: UnrecognizedPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            columns: ColumnNames::default(),
            rules: default_rules(),
            profile: SchemaProfile::default(),
            on_unrecognized: UnrecognizedPolicy::default(),
        }
    }
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        info!(path = %path.display(), rules = settings.rules.len(), "loaded settings");
        Ok(settings)
    }

    /// Settings file (if any) with CLI overrides applied.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut settings = match &cli.config {
            Some(path) => Settings::from_file(path)?,
            None => Settings::default(),
        };
        if let Some(profile) = cli.profile {
            settings.profile = profile;
        }
        if let Some(policy) = cli.on_unrecognized {
            settings.on_unrecognized = policy;
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{ "columns": { "year": "Activation Year" }, "profile": "with-quantity" }"#,
        )
        .unwrap();
        let s = Settings::from_file(&path).unwrap();
        assert_eq!(s.columns.year, "Activation Year");
        assert_eq!(s.columns.label, "Descripción SG");
        assert_eq!(s.profile, SchemaProfile::WithQuantity);
        assert_eq!(s.rules, default_rules());
        assert_eq!(s.on_unrecognized, UnrecognizedPolicy::Separate);
    }

    #[test]
    fn rules_can_be_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{ "rules": [ { "pattern": "Sodio 150W", "category": "low-intensity" } ] }"#,
        )
        .unwrap();
        let s = Settings::from_file(&path).unwrap();
        assert_eq!(s.rules.len(), 1);
        assert_eq!(s.rules[0].category, Category::LowIntensity);
    }

    #[test]
    fn cli_flags_override_file() {
        let cli = Cli::parse_from([
            "luminaria-report",
            "--profile",
            "full",
            "--on-unrecognized",
            "reject",
        ]);
        let s = Settings::resolve(&cli).unwrap();
        assert_eq!(s.profile, SchemaProfile::Full);
        assert_eq!(s.on_unrecognized, UnrecognizedPolicy::Reject);
        assert_eq!(cli.metric, Metric::Acquisition);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Settings::from_file(&path).is_err());
    }
}
