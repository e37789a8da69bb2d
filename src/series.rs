use std::collections::BTreeMap;

use chrono::naive::NaiveDate;
use serde::Serialize;

use super::csse::DailySnapshot;
use super::metric::{self, MetricOption};
use super::region::CountryRegion;

/// Summed confirmed/death/recovered for one region on one date, after
/// merging duplicate source rows. A field is `None` when monotonic
/// correction masked it as a data-quality regression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupedTotal {
    pub date: NaiveDate,
    pub confirmed: Option<u64>,
    pub death: Option<u64>,
    pub recovered: Option<u64>,
}

/// One region's chronological, duplicate-free sequence of grouped totals.
#[derive(Clone, Debug)]
pub struct RegionSeries {
    pub region: CountryRegion,
    pub totals: Vec<GroupedTotal>,
}

/// One aligned output row: a calendar date plus the derived value per
/// selected region, keyed by region id. Regions without a computable value
/// on that date are simply absent from the map.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OutputRow {
    pub date: NaiveDate,
    pub values: BTreeMap<String, f64>,
}

/// Builds one output row per date present in any of the selected regions'
/// series, each holding the chosen metric value per region. An empty
/// selection yields no rows at all. Snapshots must be ordered by date, as
/// the loader returns them.
pub fn build_series(
    regions: &[CountryRegion],
    snapshots: &[DailySnapshot],
    option: &MetricOption,
) -> Vec<OutputRow> {
    if regions.is_empty() {
        return Vec::new();
    }

    let series: Vec<RegionSeries> = regions
        .iter()
        .map(|region| region_series(region, snapshots))
        .collect();
    let dates = series_dates(&series);

    let mut rows = Vec::with_capacity(dates.len());
    for (index, date) in dates.iter().enumerate() {
        let prev_date = index.checked_sub(1).map(|prev| dates[prev]);
        let mut values = BTreeMap::new();
        for serie in &series {
            let current = match total_at(serie, *date) {
                Some(current) => current,
                None => continue,
            };
            let previous = prev_date.and_then(|prev| total_at(serie, prev));
            let info = serie.region.info.as_ref();
            if let Some(value) = metric::evaluate(current, previous, info, option) {
                values.insert(serie.region.id(), value);
            }
        }
        rows.push(OutputRow { date: *date, values });
    }
    rows
}

/// Collects one region's totals across all snapshots. Rows matching the
/// (country, region) pair exactly are summed per day; days where the region
/// is not reported produce no entry. Each field is then masked when it drops
/// below its value on the region's previous reported day. The comparison
/// always uses the previous day's raw sums, so a masked day never causes the
/// day after it to be masked as well.
pub fn region_series(region: &CountryRegion, snapshots: &[DailySnapshot]) -> RegionSeries {
    let mut totals = Vec::new();
    let mut last: Option<(u64, u64, u64)> = None;

    for snapshot in snapshots {
        let mut sums = None;
        for report in &snapshot.reports {
            if report.country == region.country && report.region == region.region {
                let entry = sums.get_or_insert((0, 0, 0));
                entry.0 += report.confirmed;
                entry.1 += report.death;
                entry.2 += report.recovered;
            }
        }
        let (confirmed, death, recovered) = match sums {
            Some(sums) => sums,
            None => continue,
        };
        totals.push(GroupedTotal {
            date: snapshot.date,
            confirmed: masked(confirmed, last.map(|l| l.0)),
            death: masked(death, last.map(|l| l.1)),
            recovered: masked(recovered, last.map(|l| l.2)),
        });
        last = Some((confirmed, death, recovered));
    }

    RegionSeries {
        region: region.clone(),
        totals,
    }
}

fn masked(current: u64, previous: Option<u64>) -> Option<u64> {
    match previous {
        Some(previous) if current < previous => None,
        _ => Some(current),
    }
}

fn series_dates(series: &[RegionSeries]) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = series
        .iter()
        .flat_map(|serie| serie.totals.iter().map(|total| total.date))
        .collect();
    dates.sort();
    dates.dedup();
    dates
}

fn total_at(serie: &RegionSeries, date: NaiveDate) -> Option<&GroupedTotal> {
    serie.totals.iter().find(|total| total.date == date)
}
