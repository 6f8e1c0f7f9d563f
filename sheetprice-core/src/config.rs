//! Configuration system for price imports

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATABASE_ENV: &str = "DATABASE_URL";
pub const DEFAULT_COMMIT_EVERY: usize = 50;
pub const DEFAULT_NOT_FOUND_DETAILS: usize = 5;

/// Main import configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default)]
    pub layout: ColumnLayout,
    #[serde(default)]
    pub columns: ColumnOverrides,
    /// Worksheet to read (first sheet when unset)
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default)]
    pub trim_keys: bool,
    #[serde(default)]
    pub null_prices: NullPricePolicy,
    /// Rows per transaction; 0 commits once at the end of the run
    #[serde(default = "default_commit_every")]
    pub commit_every: usize,
    /// How many "not found" rows are printed in detail
    #[serde(default = "default_not_found_details")]
    pub not_found_details: usize,
    #[serde(default)]
    pub checkpoint: Option<PathBuf>,
    #[serde(default = "default_database_env")]
    pub database_url_env: String,
}

fn default_commit_every() -> usize {
    DEFAULT_COMMIT_EVERY
}

fn default_not_found_details() -> usize {
    DEFAULT_NOT_FOUND_DETAILS
}

fn default_database_env() -> String {
    DEFAULT_DATABASE_ENV.to_string()
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            layout: ColumnLayout::default(),
            columns: ColumnOverrides::default(),
            sheet: None,
            trim_keys: false,
            null_prices: NullPricePolicy::default(),
            commit_every: DEFAULT_COMMIT_EVERY,
            not_found_details: DEFAULT_NOT_FOUND_DETAILS,
            checkpoint: None,
            database_url_env: default_database_env(),
        }
    }
}

impl ImportConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Header names after applying per-column overrides to the layout preset
    pub fn column_names(&self) -> ColumnNames {
        let base = self.layout.column_names();
        let pick = |value: &Option<String>, fallback: String| value.clone().unwrap_or(fallback);
        ColumnNames {
            product: pick(&self.columns.product, base.product),
            variant: pick(&self.columns.variant, base.variant),
            price_city: pick(&self.columns.price_city, base.price_city),
            price_interior: pick(&self.columns.price_interior, base.price_interior),
            price_special: pick(&self.columns.price_special, base.price_special),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (role, name) in self.column_names().roles() {
            if name.trim().is_empty() {
                return Err(ConfigError::EmptyColumnName(role));
            }
        }
        Ok(())
    }
}

/// Named header conventions for the five required columns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnLayout {
    /// Nombre / Variante / Precio Ciudad / Precio Interior / Precio Especial
    #[default]
    Catalog,
    /// Descripción del modelo / Descripcion / ciudad / interior / especial
    PriceList,
}

impl ColumnLayout {
    pub fn column_names(self) -> ColumnNames {
        match self {
            ColumnLayout::Catalog => ColumnNames::new(
                "Nombre",
                "Variante",
                "Precio Ciudad",
                "Precio Interior",
                "Precio Especial",
            ),
            ColumnLayout::PriceList => ColumnNames::new(
                "Descripción del modelo",
                "Descripcion",
                "ciudad",
                "interior",
                "especial",
            ),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ColumnLayout::Catalog => "catalog",
            ColumnLayout::PriceList => "price-list",
        }
    }
}

/// Optional per-column header overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnOverrides {
    pub product: Option<String>,
    pub variant: Option<String>,
    pub price_city: Option<String>,
    pub price_interior: Option<String>,
    pub price_special: Option<String>,
}

/// The header names a run requires
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    pub product: String,
    pub variant: String,
    pub price_city: String,
    pub price_interior: String,
    pub price_special: String,
}

impl ColumnNames {
    pub fn new(
        product: impl Into<String>,
        variant: impl Into<String>,
        price_city: impl Into<String>,
        price_interior: impl Into<String>,
        price_special: impl Into<String>,
    ) -> Self {
        Self {
            product: product.into(),
            variant: variant.into(),
            price_city: price_city.into(),
            price_interior: price_interior.into(),
            price_special: price_special.into(),
        }
    }

    /// (role, header name) pairs in column order
    pub fn roles(&self) -> [(&'static str, &str); 5] {
        [
            ("product", self.product.as_str()),
            ("variant", self.variant.as_str()),
            ("price_city", self.price_city.as_str()),
            ("price_interior", self.price_interior.as_str()),
            ("price_special", self.price_special.as_str()),
        ]
    }
}

/// What an empty price cell does to the stored price
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NullPricePolicy {
    /// Write NULL over the stored price
    #[default]
    Overwrite,
    /// Leave the stored price unchanged
    Keep,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ImportConfig::from_toml_str("").unwrap();
        assert_eq!(config, ImportConfig::default());
        assert_eq!(config.commit_every, 50);
        assert_eq!(config.not_found_details, 5);
        assert_eq!(config.database_url_env, "DATABASE_URL");
        assert_eq!(config.column_names().product, "Nombre");
    }

    #[test]
    fn test_layout_and_overrides() {
        let config = ImportConfig::from_toml_str(
            r#"
            layout = "price-list"
            null_prices = "keep"
            commit_every = 0

            [columns]
            variant = "Descripción"
            "#,
        )
        .unwrap();

        let names = config.column_names();
        assert_eq!(names.product, "Descripción del modelo");
        assert_eq!(names.variant, "Descripción");
        assert_eq!(names.price_special, "especial");
        assert_eq!(config.null_prices, NullPricePolicy::Keep);
        assert_eq!(config.commit_every, 0);
    }

    #[test]
    fn test_unknown_layout_is_rejected() {
        assert!(ImportConfig::from_toml_str(r#"layout = "legacy""#).is_err());
    }

    #[test]
    fn test_validation() {
        let config = ImportConfig::default();
        assert!(config.validate().is_ok());

        let mut bad_config = config.clone();
        bad_config.columns.price_city = Some("  ".to_string());
        assert!(matches!(
            bad_config.validate(),
            Err(ConfigError::EmptyColumnName("price_city"))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheetprice.toml");
        fs::write(&path, "sheet = \"Precios\"\ntrim_keys = true\n").unwrap();

        let config = ImportConfig::from_file(&path).unwrap();
        assert_eq!(config.sheet.as_deref(), Some("Precios"));
        assert!(config.trim_keys);

        let missing = ImportConfig::from_file(dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
