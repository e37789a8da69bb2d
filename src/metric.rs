use super::countries::CountryInfo;
use super::series::GroupedTotal;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Metric {
    #[default]
    Confirmed,
    Death,
    Recovered,
    /// Confirmed minus deaths minus recoveries; derived, not reported.
    Active,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Normalization {
    #[default]
    None,
    /// Cases per 1000 inhabitants.
    Population,
    /// Cases per km² of land area.
    Surface,
    /// Share of that day's confirmed count.
    ConfirmedRatio,
    /// First-order days-to-double estimate from the two latest points.
    TimeToDouble,
}

impl Metric {
    /// Unknown names select the default metric.
    pub fn from_name(name: &str) -> Self {
        match name {
            "death" => Self::Death,
            "recovered" => Self::Recovered,
            "active" => Self::Active,
            _ => Self::Confirmed,
        }
    }
}

impl Normalization {
    /// Unknown names fall back to no normalization, which leaves the base
    /// value unchanged.
    pub fn from_name(name: &str) -> Self {
        match name {
            "population" => Self::Population,
            "surface" => Self::Surface,
            "confirmed" => Self::ConfirmedRatio,
            "time-to-double" => Self::TimeToDouble,
            _ => Self::None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricOption {
    pub metric: Metric,
    pub normalization: Normalization,
}

/// Derives one display value for one region on one date. Returns `None`
/// whenever the value is not computable: masked base value, missing
/// reference facts, missing previous-day totals, zero denominators, or any
/// non-finite intermediate. Never yields NaN or infinity.
pub fn evaluate(
    current: &GroupedTotal,
    previous: Option<&GroupedTotal>,
    info: Option<&CountryInfo>,
    option: &MetricOption,
) -> Option<f64> {
    let base = base_value(option.metric, current)?;
    let value = match option.normalization {
        Normalization::None => base,
        Normalization::Population => base * 1000.0 / info?.population,
        Normalization::Surface => base / info?.area,
        Normalization::ConfirmedRatio => match current.confirmed {
            Some(confirmed) if confirmed != 0 => base / confirmed as f64,
            _ => return None,
        },
        Normalization::TimeToDouble => {
            let delta = base - base_value(option.metric, previous?)?;
            match delta == 0.0 {
                true => return None,
                false => 2.0 * base / delta,
            }
        }
    };
    value.is_finite().then_some(value)
}

fn base_value(metric: Metric, totals: &GroupedTotal) -> Option<f64> {
    match metric {
        Metric::Confirmed => totals.confirmed.map(|v| v as f64),
        Metric::Death => totals.death.map(|v| v as f64),
        Metric::Recovered => totals.recovered.map(|v| v as f64),
        Metric::Active => {
            let confirmed = totals.confirmed? as f64;
            let death = totals.death? as f64;
            let recovered = totals.recovered? as f64;
            Some(confirmed - death - recovered)
        }
    }
}
