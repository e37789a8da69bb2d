use serde::Serialize;

use super::region::CountryRegion;
use super::tabular;

/// Country-level reference facts from a geonames-style tab-separated table.
/// Unparsable area or population values become 0 and are rejected later by
/// the metric evaluator's finiteness guard.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CountryInfo {
    pub code: String,
    pub fips: String,
    pub name: String,
    pub area: f64,
    pub population: f64,
}

/// Parses the reference table: `iso2, iso3, isoNumeric, fips, name, capital,
/// area, population, ...`; trailing columns are ignored and the header row is
/// skipped.
pub fn parse_country_infos(text: &str) -> Vec<CountryInfo> {
    tabular::parse(text, b'\t')
        .iter()
        .skip(1)
        .map(|parts| CountryInfo {
            code: field(parts, 0).to_string(),
            fips: field(parts, 3).to_string(),
            name: field(parts, 4).to_string(),
            area: parse_number(field(parts, 6)),
            population: parse_number(field(parts, 7)),
        })
        .collect()
}

/// Attaches to each region the first reference record whose country name
/// contains the region name, case-insensitively. This is a best-effort
/// heuristic, ambiguous by construction ("Georgia" the country shadows
/// "Georgia" the US state); first match wins.
pub fn attach_country_info(regions: &mut [CountryRegion], infos: &[CountryInfo]) {
    for region in regions {
        if region.region.is_empty() {
            continue;
        }
        let needle = region.region.to_lowercase();
        region.info = infos
            .iter()
            .find(|info| !info.name.is_empty() && info.name.to_lowercase().contains(&needle))
            .cloned();
    }
}

fn field(parts: &[String], index: usize) -> &str {
    parts.get(index).map(String::as_str).unwrap_or("")
}

fn parse_number(value: &str) -> f64 {
    value.trim().parse().unwrap_or(0.0)
}
