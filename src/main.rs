use std::env;
use std::path::PathBuf;
use std::process;

use serde::Serialize;
use tracing_subscriber::EnvFilter;

use covid19_series::countries;
use covid19_series::csse;
use covid19_series::dataset::Dataset;
use covid19_series::error::Result;
use covid19_series::metric::{Metric, MetricOption, Normalization};
use covid19_series::region::CountryRegion;
use covid19_series::series::OutputRow;

#[derive(Serialize)]
struct Output {
    regions: Vec<RegionEntry>,
    rows: Vec<OutputRow>,
}

#[derive(Serialize)]
struct RegionEntry {
    id: String,
    label: String,
}

struct Args {
    selections: Vec<String>,
    option: MetricOption,
    countries_path: Option<PathBuf>,
    cache_path: Option<PathBuf>,
    out_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = parse_args();

    let mut dataset = Dataset::load(csse::BASE_URL, args.cache_path.as_deref()).await;

    if let Some(path) = &args.countries_path {
        let infos = countries::parse_country_infos(&std::fs::read_to_string(path)?);
        dataset.attach_country_info(&infos);
    }

    let selected: Vec<CountryRegion> = args
        .selections
        .iter()
        .map(|selection| resolve(selection, &dataset))
        .collect();

    let rows = dataset.build_series(&selected, &args.option);
    let output = Output {
        regions: selected
            .iter()
            .map(|region| RegionEntry {
                id: region.id(),
                label: region.label(),
            })
            .collect(),
        rows,
    };

    let json = serde_json::to_string_pretty(&output)?;
    match &args.out_path {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{}", json),
    }

    Ok(())
}

/// Selections are `Country` or `Country/Region`; country-level rows carry
/// the country name as their region.
fn resolve(selection: &str, dataset: &Dataset) -> CountryRegion {
    let (country, region) = match selection.split_once('/') {
        Some((country, region)) => (country, region),
        None => (selection, selection),
    };
    dataset
        .find_region(country, region)
        .cloned()
        .unwrap_or_else(|| CountryRegion::new(country, region))
}

fn parse_args() -> Args {
    let mut args = Args {
        selections: Vec::new(),
        option: MetricOption::default(),
        countries_path: None,
        cache_path: Some(PathBuf::from("cache")),
        out_path: None,
    };

    let mut argv = env::args().skip(1);
    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--metric" => args.option.metric = Metric::from_name(&expect_value(&arg, &mut argv)),
            "--per" => {
                args.option.normalization =
                    Normalization::from_name(&expect_value(&arg, &mut argv))
            }
            "--countries" => args.countries_path = Some(PathBuf::from(expect_value(&arg, &mut argv))),
            "--cache" => args.cache_path = Some(PathBuf::from(expect_value(&arg, &mut argv))),
            "--no-cache" => args.cache_path = None,
            "--out" => args.out_path = Some(PathBuf::from(expect_value(&arg, &mut argv))),
            "--help" | "-h" => {
                usage();
                process::exit(0);
            }
            flag if flag.starts_with("--") => {
                eprintln!("unknown option: {}", flag);
                usage();
                process::exit(2);
            }
            selection => args.selections.push(selection.to_string()),
        }
    }

    if args.selections.is_empty() {
        args.selections = vec![
            "Italy", "Spain", "Belgium", "Netherlands", "France", "Germany", "US", "China/Hubei",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();
    }

    args
}

fn expect_value(flag: &str, argv: &mut impl Iterator<Item = String>) -> String {
    match argv.next() {
        Some(value) => value,
        None => {
            eprintln!("missing value for {}", flag);
            process::exit(2);
        }
    }
}

fn usage() {
    eprintln!(
        "usage: covid19-series-rs [options] [COUNTRY | COUNTRY/REGION]...\n\
         \n\
         options:\n\
         \x20 --metric <confirmed|death|recovered|active>\n\
         \x20 --per <none|population|surface|confirmed|time-to-double>\n\
         \x20 --countries <geonames tsv>   attach population/area facts\n\
         \x20 --cache <dir>                snapshot cache directory (default: cache)\n\
         \x20 --no-cache                   always refetch\n\
         \x20 --out <file>                 write JSON here instead of stdout"
    );
}
