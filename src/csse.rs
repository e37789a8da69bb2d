use std::path::Path;

use chrono::naive::NaiveDate;
use chrono::Local;
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use super::error::{Error, Result};
use super::tabular;
use super::NaiveDateRange;

pub const BASE_URL: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19\
                            /master/csse_covid_19_data/csse_covid_19_daily_reports";

/// One region's cumulative totals as reported on one day. `date_string` is
/// the raw last-update column from the source row; series alignment uses the
/// snapshot date instead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DailyReport {
    pub country: String,
    pub region: String,
    pub date_string: String,
    pub confirmed: u64,
    pub death: u64,
    pub recovered: u64,
}

/// All report rows published for one calendar day. Days whose source could
/// not be retrieved have no snapshot at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    pub reports: Vec<DailyReport>,
}

pub fn first_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 22).unwrap()
}

/// Loads every daily report snapshot from the first published date up to
/// (but not including) today.
pub async fn snapshots(base_url: &str, cache_path: Option<&Path>) -> Vec<DailySnapshot> {
    let today = Local::now().date_naive();
    snapshots_range(base_url, cache_path, first_date(), today).await
}

/// Fetches one snapshot per day in `[from, to)`, all days concurrently. A
/// day that cannot be retrieved or is missing upstream is simply absent from
/// the result; one bad day never fails the batch.
pub async fn snapshots_range(
    base_url: &str,
    cache_path: Option<&Path>,
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<DailySnapshot> {
    let client = reqwest::Client::new();
    let days = join_all(NaiveDateRange(from, to).map(|date| {
        let client = &client;
        async move {
            match snapshot_for_day(client, base_url, cache_path, date).await {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    warn!("{}: fetch failed: {}", date, err);
                    None
                }
            }
        }
    }))
    .await;
    days.into_iter().flatten().collect()
}

async fn snapshot_for_day(
    client: &reqwest::Client,
    base_url: &str,
    cache_path: Option<&Path>,
    date: NaiveDate,
) -> Result<Option<DailySnapshot>> {
    let name = format!("{}.csv", date.format("%m-%d-%Y"));

    if let Some(cache_path) = cache_path {
        let cache_file = cache_path.join("csse").join(&name);
        if cache_file.exists() {
            let body = tokio::fs::read_to_string(&cache_file).await?;
            return Ok(Some(parse_snapshot(date, &body)));
        }
    }

    let body = match download_day(client, base_url, &name).await? {
        Some(body) => body,
        None => return Ok(None),
    };

    if let Some(cache_path) = cache_path {
        let cache_dir = cache_path.join("csse");
        let written = match tokio::fs::create_dir_all(&cache_dir).await {
            Ok(()) => tokio::fs::write(cache_dir.join(&name), &body).await,
            Err(err) => Err(err),
        };
        if let Err(err) = written {
            warn!("{}: cache write failed: {}", date, err);
        }
    }

    Ok(Some(parse_snapshot(date, &body)))
}

async fn download_day(
    client: &reqwest::Client,
    base_url: &str,
    name: &str,
) -> Result<Option<String>> {
    info!("downloading {}...", name);
    let res = client.get(format!("{}/{}", base_url, name)).send().await?;
    match res.status().as_u16() {
        404 => Ok(None),
        200 => Ok(Some(res.text().await?)),
        _ => Err(Error::Http(res.status())),
    }
}

/// Parses one day's raw CSV body, skipping the header row.
pub fn parse_snapshot(date: NaiveDate, body: &str) -> DailySnapshot {
    let reports = tabular::parse(body, b',')
        .iter()
        .skip(1)
        .map(|parts| parse_report_line(parts))
        .collect();
    DailySnapshot { date, reports }
}

/// Parses one report row by field position. Two source layouts exist: the
/// legacy narrow one and, from late March 2020 on, a wider one with extra
/// leading columns; a row with more than 8 fields is the wide layout.
pub fn parse_report_line(parts: &[String]) -> DailyReport {
    let wide = parts.len() > 8;

    let region = field(parts, if wide { 2 } else { 0 });
    let country = field(parts, if wide { 3 } else { 1 });
    let date_string = field(parts, if wide { 5 } else { 2 });
    let confirmed = parse_count(field(parts, if wide { 7 } else { 3 }));
    let death = parse_count(field(parts, if wide { 8 } else { 4 }));
    let recovered = parse_count(field(parts, if wide { 9 } else { 5 }));

    let country = match country {
        "Mainland China" => "China",
        other => other,
    };

    DailyReport {
        country: country.to_string(),
        region: match region.is_empty() {
            true => country.to_string(),
            false => region.to_string(),
        },
        date_string: date_string.to_string(),
        confirmed,
        death,
        recovered,
    }
}

fn field(parts: &[String], index: usize) -> &str {
    parts.get(index).map(String::as_str).unwrap_or("")
}

fn parse_count(value: &str) -> u64 {
    let value = value.trim();
    value
        .parse()
        .ok()
        .or_else(|| value.parse::<f64>().ok().map(|v| v as u64))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn parts(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn legacy_row_by_position() {
        let report = parse_report_line(&parts(&[
            "Hubei", "Mainland China", "1/22/2020 17:00", "444", "17", "28",
        ]));
        assert_eq!(report.region, "Hubei");
        assert_eq!(report.country, "China");
        assert_eq!(report.date_string, "1/22/2020 17:00");
        assert_eq!(report.confirmed, 444);
        assert_eq!(report.death, 17);
        assert_eq!(report.recovered, 28);
    }

    #[test]
    fn wide_row_by_position() {
        let report = parse_report_line(&parts(&[
            "45001",
            "Abbeville",
            "South Carolina",
            "US",
            "2020-04-05 23:06:45",
            "34.22",
            "-82.46",
            "6",
            "1",
            "0",
            "5",
            "Abbeville, South Carolina, US",
        ]));
        assert_eq!(report.region, "South Carolina");
        assert_eq!(report.country, "US");
        assert_eq!(report.confirmed, 6);
        assert_eq!(report.death, 1);
        assert_eq!(report.recovered, 0);
    }

    #[test]
    fn both_layouts_yield_equivalent_reports() {
        let legacy = parse_report_line(&parts(&["Hubei", "China", "d", "10", "2", "3"]));
        let wide = parse_report_line(&parts(&[
            "", "", "Hubei", "China", "", "d", "", "10", "2", "3",
        ]));
        assert_eq!(legacy.region, wide.region);
        assert_eq!(legacy.country, wide.country);
        assert_eq!(
            (legacy.confirmed, legacy.death, legacy.recovered),
            (wide.confirmed, wide.death, wide.recovered)
        );
    }

    #[test]
    fn blank_region_defaults_to_country() {
        let report = parse_report_line(&parts(&["", "Italy", "", "3", "0", "0"]));
        assert_eq!(report.region, "Italy");
    }

    #[test]
    fn counts_never_negative_and_garbage_is_zero() {
        let report = parse_report_line(&parts(&["r", "c", "d", "-5", "oops", ""]));
        assert_eq!(report.confirmed, 0);
        assert_eq!(report.death, 0);
        assert_eq!(report.recovered, 0);
    }

    #[test]
    fn decimal_counts_are_truncated() {
        let report = parse_report_line(&parts(&["r", "c", "d", "14.0", "3.7", "0"]));
        assert_eq!(report.confirmed, 14);
        assert_eq!(report.death, 3);
    }

    #[test]
    fn short_row_yields_zeroed_report() {
        let report = parse_report_line(&parts(&["Hubei", "China"]));
        assert_eq!(report.region, "Hubei");
        assert_eq!(report.confirmed, 0);
    }

    #[test]
    fn snapshot_skips_header_row() {
        let body = "Province/State,Country/Region,Last Update,Confirmed,Deaths,Recovered\n\
                    Hubei,Mainland China,1/22/2020 17:00,444,17,28\n";
        let snapshot = parse_snapshot(date(2020, 1, 22), body);
        assert_eq!(snapshot.reports.len(), 1);
        assert_eq!(snapshot.reports[0].country, "China");
    }

    #[tokio::test]
    async fn failed_days_are_absent_not_errors() {
        let mut server = mockito::Server::new_async().await;
        let ok = server
            .mock("GET", "/01-22-2020.csv")
            .with_status(200)
            .with_body(
                "Province/State,Country/Region,Last Update,Confirmed,Deaths,Recovered\n\
                 Hubei,Mainland China,1/22/2020 17:00,444,17,28\n",
            )
            .create_async()
            .await;
        let missing = server
            .mock("GET", "/01-23-2020.csv")
            .with_status(404)
            .create_async()
            .await;
        let broken = server
            .mock("GET", "/01-24-2020.csv")
            .with_status(500)
            .create_async()
            .await;

        let loaded = snapshots_range(
            &server.url(),
            None,
            date(2020, 1, 22),
            date(2020, 1, 25),
        )
        .await;

        ok.assert_async().await;
        missing.assert_async().await;
        broken.assert_async().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].date, date(2020, 1, 22));
        assert_eq!(loaded[0].reports[0].confirmed, 444);
    }

    #[tokio::test]
    async fn cached_day_is_not_refetched() {
        let cache = tempfile::tempdir().unwrap();
        let dir = cache.path().join("csse");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(
            dir.join("01-22-2020.csv"),
            "h,h,h,h,h,h\nHubei,China,1/22/2020,444,17,28\n",
        )
        .await
        .unwrap();

        // Unreachable base URL: the only possible source is the cache.
        let loaded = snapshots_range(
            "http://127.0.0.1:1",
            Some(cache.path()),
            date(2020, 1, 22),
            date(2020, 1, 23),
        )
        .await;

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].reports[0].region, "Hubei");
    }

    #[tokio::test]
    async fn downloaded_day_is_written_to_cache() {
        let cache = tempfile::tempdir().unwrap();
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/01-22-2020.csv")
            .with_status(200)
            .with_body("h\nHubei,China,d,1,0,0\n")
            .create_async()
            .await;

        snapshots_range(
            &server.url(),
            Some(cache.path()),
            date(2020, 1, 22),
            date(2020, 1, 23),
        )
        .await;

        let cached = cache.path().join("csse").join("01-22-2020.csv");
        assert!(cached.exists());
    }
}
