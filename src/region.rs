use serde::Serialize;

use super::countries::CountryInfo;

/// A (country, region) pair identifying one reported series. Country-level
/// rows carry the country name as their region, so the region label is never
/// empty for loaded data. Reference facts are attached once by the join in
/// `countries` and reused by every query afterwards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CountryRegion {
    pub country: String,
    pub region: String,
    pub info: Option<CountryInfo>,
}

impl CountryRegion {
    pub fn new(country: &str, region: &str) -> Self {
        CountryRegion {
            country: country.to_string(),
            region: region.to_string(),
            info: None,
        }
    }

    /// Compact identity key: 5 chars of the country plus 8 of the region,
    /// lowercased and trimmed. Distinct long names that truncate to the same
    /// prefix collide; callers must treat the id as opaque and best-effort.
    pub fn id(&self) -> String {
        format!("{}_{}", key_part(&self.country, 5), key_part(&self.region, 8))
    }

    /// Display label: `Country` or `Country (Region)`.
    pub fn label(&self) -> String {
        match self.region.is_empty() {
            true => self.country.clone(),
            false => format!("{} ({})", self.country, self.region),
        }
    }
}

fn key_part(value: &str, len: usize) -> String {
    value.trim().to_lowercase().chars().take(len).collect()
}
