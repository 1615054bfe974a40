use common::AttributeVector;
use serde::{Deserialize, Serialize};

/// One oyster in a catalog import file.
///
/// ```toml
/// [[item]]
/// name = "Kumamoto"
/// species = "Crassostrea sikamea"
/// origin = "Humboldt Bay, CA"
/// size = 3
/// body = 6
/// sweet_brininess = 3
/// flavorfulness = 6
/// creaminess = 7
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub species: Option<String>,
    pub origin: Option<String>,
    #[serde(flatten)]
    pub seed: AttributeVector,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "item")]
    items: Vec<CatalogEntry>,
}

/// Parse a TOML catalog made of `[[item]]` tables.
pub fn parse_catalog(text: &str) -> Result<Vec<CatalogEntry>, toml::de::Error> {
    let file: CatalogFile = toml::from_str(text)?;
    Ok(file.items)
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub inserted: usize,
    /// Existing items whose seed data was replaced; their ratings need a recompute.
    pub updated_ids: Vec<i32>,
}
