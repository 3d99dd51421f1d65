//! Local catalog records pushed to the remote side.
//!
//! The connector's push operations need a source of company and item records.
//! Behind [`CatalogSource`] the production implementation reads a TOML catalog
//! file; tests substitute fixed record sets.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;
use shared::protocol::{CompanyPayload, PricePayload, ProductPayload, SizePayload};
use shared::domain::StyleNumber;

pub trait CatalogSource: Send + Sync {
    fn companies(&self) -> Result<Vec<CompanyRecord>>;
    fn items(&self) -> Result<Vec<ItemRecord>>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompanyRecord {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemRecord {
    pub item_code: String,
    pub item_name: String,
    pub wholesale_price: f64,
    pub retail_price: f64,
    #[serde(default)]
    pub item_group: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_sizes")]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub size_group: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub available_now: bool,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_sizes() -> Vec<String> {
    // One-size is the catalog default, as wholesale styles commonly are.
    vec!["OS".to_string()]
}

impl ItemRecord {
    /// Maps one catalog item onto the product payload the remote side expects.
    /// The item code doubles as external id, unique key, and brand id.
    pub fn to_product(&self) -> ProductPayload {
        let price = PricePayload {
            wholesale: self.wholesale_price,
            retail: self.retail_price,
            disabled: false,
        };
        let mut pricing = BTreeMap::new();
        pricing.insert(self.currency.clone(), price.clone());

        let sizes = self
            .sizes
            .iter()
            .map(|size| SizePayload {
                size: size.clone(),
                size_group: self.size_group.clone(),
                pricing: pricing.clone(),
            })
            .collect();

        ProductPayload {
            style_number: StyleNumber(self.item_code.clone()),
            name: self.item_name.clone(),
            external_id: self.item_code.clone(),
            unique_key: self.item_code.clone(),
            season: self.season.clone(),
            color: self.color.clone(),
            category: self.item_group.clone(),
            brand_id: Some(self.item_code.clone()),
            sizes,
            size_groups: self.size_group.clone().into_iter().collect(),
            seasons: self.season.clone().into_iter().collect(),
            pricing,
            available_now: self.available_now,
            active: true,
            cancelled: false,
            archived: false,
            description: self.description.clone(),
            available_from: None,
            available_until: None,
            order_closing: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "company")]
    companies: Vec<CompanyRecord>,
    #[serde(default, rename = "item")]
    items: Vec<ItemRecord>,
}

/// Catalog backed by a TOML file with `[[company]]` and `[[item]]` tables.
/// The file is re-read on every call so edits take effect without restarts.
pub struct TomlCatalog {
    path: PathBuf,
}

impl TomlCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> Result<CatalogFile> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read catalog '{}'", self.path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("catalog '{}' is not valid TOML", self.path.display()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogSource for TomlCatalog {
    fn companies(&self) -> Result<Vec<CompanyRecord>> {
        Ok(self.read()?.companies)
    }

    fn items(&self) -> Result<Vec<ItemRecord>> {
        Ok(self.read()?.items)
    }
}

/// Stand-in used when no catalog is configured; every read fails with a
/// pointer at the missing setting, which the push actions surface as-is.
pub struct MissingCatalog;

impl CatalogSource for MissingCatalog {
    fn companies(&self) -> Result<Vec<CompanyRecord>> {
        anyhow::bail!("no catalog configured; set `catalog_path` in the settings")
    }

    fn items(&self) -> Result<Vec<ItemRecord>> {
        anyhow::bail!("no catalog configured; set `catalog_path` in the settings")
    }
}

/// Derives company payloads (name + hashed code) for a record batch.
pub fn company_payloads(records: &[CompanyRecord]) -> Vec<CompanyPayload> {
    records
        .iter()
        .map(|record| CompanyPayload::from_name(record.name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    const SAMPLE: &str = r#"
[[company]]
name = "Acme Wholesale"

[[company]]
name = "Globex Retail"

[[item]]
item_code = "ST-100"
item_name = "Sample Tee"
item_group = "Shirts"
wholesale_price = 10.0
retail_price = 12.1
sizes = ["S", "M", "L"]
size_group = "A1"

[[item]]
item_code = "ST-200"
item_name = "Sample Cap"
wholesale_price = 5.0
retail_price = 9.0
"#;

    #[test]
    fn reads_companies_and_items_from_toml() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("nuorder_catalog_test_{suffix}.toml"));
        fs::write(&path, SAMPLE).expect("write catalog");

        let catalog = TomlCatalog::new(&path);
        let companies = catalog.companies().expect("companies");
        assert_eq!(companies.len(), 2);
        let items = catalog.items().expect("items");
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].sizes, vec!["OS".to_string()]);
        assert_eq!(items[1].currency, "USD");

        fs::remove_file(path).expect("cleanup");
    }

    #[test]
    fn item_maps_onto_product_payload() {
        let item = ItemRecord {
            item_code: "ST-100".to_string(),
            item_name: "Sample Tee".to_string(),
            wholesale_price: 10.0,
            retail_price: 12.1,
            item_group: Some("Shirts".to_string()),
            description: None,
            currency: "USD".to_string(),
            sizes: vec!["S".to_string(), "M".to_string()],
            size_group: Some("A1".to_string()),
            season: Some("spring/summer".to_string()),
            color: None,
            available_now: true,
        };

        let product = item.to_product();
        assert_eq!(product.style_number.as_str(), "ST-100");
        assert_eq!(product.external_id, "ST-100");
        assert_eq!(product.unique_key, "ST-100");
        assert_eq!(product.brand_id.as_deref(), Some("ST-100"));
        assert_eq!(product.category.as_deref(), Some("Shirts"));
        assert_eq!(product.sizes.len(), 2);
        assert_eq!(product.sizes[0].pricing["USD"].wholesale, 10.0);
        assert_eq!(product.seasons, vec!["spring/summer".to_string()]);
        assert!(product.active);
        assert!(!product.cancelled);
    }
}
