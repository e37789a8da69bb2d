use std::path::Path;

use super::countries::{self, CountryInfo};
use super::csse::{self, DailySnapshot};
use super::metric::MetricOption;
use super::region::CountryRegion;
use super::series::{self, OutputRow};

/// The loaded snapshot sequence plus the listings derived from it, computed
/// once per load. Queries borrow the dataset read-only; reloading means
/// building a new one and dropping this one.
#[derive(Clone, Debug)]
pub struct Dataset {
    snapshots: Vec<DailySnapshot>,
    countries: Vec<String>,
    regions: Vec<CountryRegion>,
    dates: Vec<String>,
}

impl Dataset {
    pub async fn load(base_url: &str, cache_path: Option<&Path>) -> Self {
        Self::from_snapshots(csse::snapshots(base_url, cache_path).await)
    }

    pub fn from_snapshots(snapshots: Vec<DailySnapshot>) -> Self {
        let countries = list_countries(&snapshots);
        let regions = list_regions(&snapshots);
        let dates = list_dates(&snapshots);
        Dataset {
            snapshots,
            countries,
            regions,
            dates,
        }
    }

    pub fn snapshots(&self) -> &[DailySnapshot] {
        &self.snapshots
    }

    /// Distinct country names, ascending, compared case-insensitively.
    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    /// Distinct (country, region) pairs in the order first encountered.
    pub fn regions(&self) -> &[CountryRegion] {
        &self.regions
    }

    /// Distinct snapshot dates in the order loaded.
    pub fn dates(&self) -> &[String] {
        &self.dates
    }

    pub fn find_region(&self, country: &str, region: &str) -> Option<&CountryRegion> {
        self.regions
            .iter()
            .find(|r| r.country == country && r.region == region)
    }

    /// One-time enrichment: joins reference facts onto the region list.
    pub fn attach_country_info(&mut self, infos: &[CountryInfo]) {
        countries::attach_country_info(&mut self.regions, infos);
    }

    pub fn build_series(&self, selected: &[CountryRegion], option: &MetricOption) -> Vec<OutputRow> {
        series::build_series(selected, &self.snapshots, option)
    }
}

fn list_countries(snapshots: &[DailySnapshot]) -> Vec<String> {
    let mut countries: Vec<String> = Vec::new();
    for snapshot in snapshots {
        for report in &snapshot.reports {
            if !countries.contains(&report.country) {
                countries.push(report.country.clone());
            }
        }
    }
    countries.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()));
    countries
}

fn list_regions(snapshots: &[DailySnapshot]) -> Vec<CountryRegion> {
    let mut regions: Vec<CountryRegion> = Vec::new();
    for snapshot in snapshots {
        for report in &snapshot.reports {
            let seen = regions
                .iter()
                .any(|r| r.country == report.country && r.region == report.region);
            if !seen {
                regions.push(CountryRegion::new(&report.country, &report.region));
            }
        }
    }
    regions
}

fn list_dates(snapshots: &[DailySnapshot]) -> Vec<String> {
    let mut dates: Vec<String> = Vec::new();
    for snapshot in snapshots {
        let date = snapshot.date.format("%Y-%m-%d").to_string();
        if !dates.contains(&date) {
            dates.push(date);
        }
    }
    dates
}
