//! Root-zone storage deficit recurrence.
//!
//! For each site and policy the daily anomaly is demand minus precipitation,
//! `A(t) = X(t) - P(t)`, and the deficit carries forward floored at zero:
//!
//! ```text
//! D(0) = 0
//! D(t) = max(A(t) + D(t-1), 0)
//! ```
//!
//! The "original" policy uses ET as demand, the "snow-accounting" policy uses
//! snow-masked ET. Both run over the same days and precipitation and never
//! read each other's state.

use crate::snow::{is_snow_masked, SnowThreshold};
use chrono::NaiveDate;
use rzd_core::{
    error::Result,
    observation::Observation,
    site_series::SiteSeries,
    table::SiteId,
};
use serde::Serialize;

/// Which demand signal drives the recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    /// Demand is ET as estimated.
    Original,
    /// Demand is ET with snow-covered days zeroed.
    SnowAccounting,
}

impl Policy {
    pub const ALL: [Policy; 2] = [Policy::Original, Policy::SnowAccounting];

    pub fn label(&self) -> &'static str {
        match self {
            Policy::Original => "Original Method",
            Policy::SnowAccounting => "Snow-accounting Method",
        }
    }
}

/// One input day plus everything the engine derives for it.
///
/// Serialized field names are the column labels downstream consumers
/// select by.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeficitRecord {
    #[serde(rename = "id")]
    pub date: NaiveDate,
    pub point: SiteId,
    #[serde(rename = "ET")]
    pub et: f64,
    #[serde(rename = "no_snow_ET")]
    pub no_snow_et: f64,
    #[serde(rename = "prism_ppt")]
    pub precip: f64,
    pub snow_cover_fraction: f64,
    #[serde(rename = "A_old")]
    pub a_old: f64,
    #[serde(rename = "A_new")]
    pub a_new: f64,
    #[serde(rename = "D_old")]
    pub d_old: f64,
    #[serde(rename = "D_new")]
    pub d_new: f64,
    #[serde(rename = "C_old")]
    pub c_old: f64,
    #[serde(rename = "C_new")]
    pub c_new: f64,
    pub snow_masked: bool,
}

impl DeficitRecord {
    pub fn demand(&self, policy: Policy) -> f64 {
        match policy {
            Policy::Original => self.et,
            Policy::SnowAccounting => self.no_snow_et,
        }
    }

    pub fn deficit(&self, policy: Policy) -> f64 {
        match policy {
            Policy::Original => self.d_old,
            Policy::SnowAccounting => self.d_new,
        }
    }
}

/// Zero floor that lets NaN through; `f64::max` would turn it into 0.
fn floor_at_zero(value: f64) -> f64 {
    if value.is_nan() {
        value
    } else {
        value.max(0.0)
    }
}

/// Daily anomalies `demand - precip`.
pub fn anomalies(demand: &[f64], precip: &[f64]) -> Vec<f64> {
    demand.iter().zip(precip).map(|(x, p)| x - p).collect()
}

/// Run the deficit recurrence over one site's anomalies.
///
/// The first day is always 0, whatever its anomaly. From then on an undefined
/// anomaly makes that day and every later day NaN.
pub fn deficit_series(anomalies: &[f64]) -> Vec<f64> {
    anomalies
        .iter()
        .enumerate()
        .scan(0.0_f64, |previous, (t, &a)| {
            let deficit = if t == 0 {
                0.0
            } else {
                floor_at_zero(a + *previous)
            };
            *previous = deficit;
            Some(deficit)
        })
        .collect()
}

/// Running sum of anomalies, without a floor.
pub fn cumulative_anomaly(anomalies: &[f64]) -> Vec<f64> {
    anomalies
        .iter()
        .scan(0.0_f64, |sum, a| {
            *sum += a;
            Some(*sum)
        })
        .collect()
}

/// Compute both policies for a single site.
pub fn compute_site(series: &SiteSeries, threshold: SnowThreshold) -> Vec<DeficitRecord> {
    let observations = series.observations();
    let et: Vec<f64> = observations.iter().map(|o| o.et).collect();
    let precip: Vec<f64> = observations.iter().map(|o| o.precip).collect();
    let no_snow_et: Vec<f64> = observations
        .iter()
        .map(|o| threshold.mask_et(o.et, o.snow_cover_fraction))
        .collect();

    let a_old = anomalies(&et, &precip);
    let a_new = anomalies(&no_snow_et, &precip);
    let d_old = deficit_series(&a_old);
    let d_new = deficit_series(&a_new);
    let c_old = cumulative_anomaly(&a_old);
    let c_new = cumulative_anomaly(&a_new);

    observations
        .iter()
        .enumerate()
        .map(|(t, o)| DeficitRecord {
            date: o.date,
            point: o.point.clone(),
            et: o.et,
            no_snow_et: no_snow_et[t],
            precip: o.precip,
            snow_cover_fraction: o.snow_cover_fraction,
            a_old: a_old[t],
            a_new: a_new[t],
            d_old: d_old[t],
            d_new: d_new[t],
            c_old: c_old[t],
            c_new: c_new[t],
            snow_masked: is_snow_masked(o.et, no_snow_et[t]),
        })
        .collect()
}

/// Compute deficits for every site in `observations`.
///
/// Observations are grouped per site (sites in ascending order, each site's
/// rows kept in input order) and every site is validated before any
/// recurrence runs, so a failure anywhere yields no output at all.
pub fn compute_deficits(observations: Vec<Observation>, snow_frac: f64) -> Result<Vec<DeficitRecord>> {
    let threshold = SnowThreshold::new(snow_frac)?;
    let sites = SiteSeries::group_by_site(observations)?;

    let mut records = Vec::with_capacity(sites.iter().map(|s| s.len()).sum());
    for series in &sites {
        let missing = series.missing_dates();
        if !missing.is_empty() {
            log::warn!(
                "Site {} has {} calendar days without a row between {} and {}",
                series.point(),
                missing.len(),
                series.first_date(),
                series.last_date()
            );
        }
        let site_records = compute_site(series, threshold);
        log::debug!(
            "Site {}: {} days, final D_old {:.1}, final D_new {:.1}",
            series.point(),
            site_records.len(),
            site_records.last().map_or(f64::NAN, |r| r.d_old),
            site_records.last().map_or(f64::NAN, |r| r.d_new),
        );
        records.extend(site_records);
    }
    log::info!(
        "Computed deficits for {} sites ({} rows, snow_frac {})",
        sites.len(),
        records.len(),
        threshold.value()
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rzd_core::error::{DeficitError, Violation};

    fn series(point: &str, et: &[f64], precip: &[f64], snow: &[f64]) -> Vec<Observation> {
        let start = NaiveDate::from_ymd_opt(2013, 1, 1).unwrap();
        et.iter()
            .zip(precip)
            .zip(snow)
            .enumerate()
            .map(|(i, ((&et, &precip), &snow_cover_fraction))| Observation {
                point: SiteId::new(point),
                date: start + chrono::Duration::days(i as i64),
                et,
                precip,
                snow_cover_fraction,
            })
            .collect()
    }

    fn column(records: &[DeficitRecord], f: impl Fn(&DeficitRecord) -> f64) -> Vec<f64> {
        records.iter().map(f).collect()
    }

    #[test]
    fn test_scenario_a_original_policy() {
        let obs = series("0", &[2.0, 2.0, 2.0], &[5.0, 1.0, 1.0], &[0.0, 0.0, 0.0]);
        let records = compute_deficits(obs, 10.0).unwrap();
        assert_eq!(column(&records, |r| r.a_old), vec![-3.0, 1.0, 1.0]);
        assert_eq!(column(&records, |r| r.d_old), vec![0.0, 1.0, 2.0]);
        assert_eq!(column(&records, |r| r.c_old), vec![-3.0, -2.0, -1.0]);
        // nothing masked, so both policies agree
        assert_eq!(column(&records, |r| r.d_new), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_scenario_b_snow_accounting_policy() {
        let obs = series("0", &[2.0, 2.0, 2.0], &[5.0, 1.0, 1.0], &[0.0, 50.0, 0.0]);
        let records = compute_deficits(obs, 10.0).unwrap();
        assert_eq!(column(&records, |r| r.no_snow_et), vec![2.0, 0.0, 2.0]);
        assert_eq!(column(&records, |r| r.a_new), vec![-3.0, -1.0, 1.0]);
        assert_eq!(column(&records, |r| r.d_new), vec![0.0, 0.0, 1.0]);
        assert_eq!(column(&records, |r| r.d_old), vec![0.0, 1.0, 2.0]);
        let masked: Vec<bool> = records.iter().map(|r| r.snow_masked).collect();
        assert_eq!(masked, vec![false, true, false]);
    }

    #[test]
    fn test_scenario_c_single_day() {
        let obs = series("0", &[4.0], &[0.0], &[0.0]);
        let records = compute_deficits(obs, 10.0).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].d_old, 0.0);
        assert_eq!(records[0].d_new, 0.0);
        assert_eq!(records[0].a_old, 4.0);
    }

    #[test]
    fn test_scenario_d_sites_are_independent() {
        let site_a = series("0", &[2.0, 3.0, 1.0, 4.0], &[0.0, 1.0, 6.0, 0.5], &[0.0, 20.0, 0.0, 0.0]);
        let site_b = series("1", &[1.0, 1.0, 5.0, 0.0], &[3.0, 0.0, 0.0, 0.0], &[80.0, 0.0, 5.0, 0.0]);

        let alone_a = compute_deficits(site_a.clone(), 10.0).unwrap();
        let alone_b = compute_deficits(site_b.clone(), 10.0).unwrap();

        // interleave rows of both sites, site 1 first
        let mut joint_input = Vec::new();
        for (a, b) in site_a.into_iter().zip(site_b) {
            joint_input.push(b);
            joint_input.push(a);
        }
        let joint = compute_deficits(joint_input, 10.0).unwrap();

        let expected: Vec<DeficitRecord> = alone_a.into_iter().chain(alone_b).collect();
        assert_eq!(joint, expected);
    }

    #[test]
    fn test_first_day_is_zero_for_both_policies() {
        let obs = series("0", &[9.0, 1.0], &[0.0, 0.0], &[90.0, 0.0]);
        let records = compute_deficits(obs, 10.0).unwrap();
        assert_eq!(records[0].d_old, 0.0);
        assert_eq!(records[0].d_new, 0.0);
    }

    #[test]
    fn test_floor_holds_over_long_negative_run() {
        let a: Vec<f64> = std::iter::once(5.0)
            .chain(std::iter::repeat(-40.0).take(50))
            .chain(std::iter::once(3.0))
            .collect();
        let d = deficit_series(&a);
        assert!(d.iter().all(|v| *v >= 0.0));
        assert_eq!(d[0], 0.0);
        assert_eq!(d[d.len() - 1], 3.0);
    }

    #[test]
    fn test_non_decreasing_over_non_negative_anomalies() {
        let a = vec![-10.0, 0.0, 0.5, 2.0, 0.0, 7.25, 1.0];
        let d = deficit_series(&a);
        assert!(d.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(d, vec![0.0, 0.0, 0.5, 2.5, 2.5, 9.75, 10.75]);
    }

    #[test]
    fn test_clamp_then_recover() {
        let d = deficit_series(&[0.0, 3.0, -5.0, 2.0]);
        assert_eq!(d, vec![0.0, 3.0, 0.0, 2.0]);
    }

    #[test]
    fn test_snow_change_leaves_original_policy_alone() {
        let no_snow = series("0", &[2.0, 1.5, 3.0, 0.5], &[0.0, 4.0, 0.0, 0.0], &[0.0, 0.0, 0.0, 0.0]);
        let snowy = series("0", &[2.0, 1.5, 3.0, 0.5], &[0.0, 4.0, 0.0, 0.0], &[100.0, 60.0, 0.0, 99.0]);
        let a = compute_deficits(no_snow, 10.0).unwrap();
        let b = compute_deficits(snowy, 10.0).unwrap();
        assert_eq!(column(&a, |r| r.d_old), column(&b, |r| r.d_old));
        assert_ne!(column(&a, |r| r.d_new), column(&b, |r| r.d_new));
    }

    #[test]
    fn test_nan_propagates_forward() {
        let obs = series("0", &[1.0, f64::NAN, 1.0, 1.0], &[0.0, 0.0, 0.0, 0.0], &[0.0, 0.0, 0.0, 0.0]);
        let records = compute_deficits(obs, 10.0).unwrap();
        assert_eq!(records[0].d_old, 0.0);
        assert!(records[1..].iter().all(|r| r.d_old.is_nan()));
        assert!(records[1..].iter().all(|r| r.d_new.is_nan()));
        assert!(records[1..].iter().all(|r| r.c_old.is_nan()));
    }

    #[test]
    fn test_nan_on_first_day_leaves_deficit_at_zero() {
        let d = deficit_series(&[f64::NAN, 1.0, 2.0]);
        assert_eq!(d, vec![0.0, 1.0, 3.0]);
    }

    #[test]
    fn test_undefined_first_precip_only_touches_anomaly() {
        let obs = series("0", &[2.0, 2.0], &[f64::NAN, 1.0], &[0.0, 0.0]);
        let records = compute_deficits(obs, 10.0).unwrap();
        assert_eq!(column(&records, |r| r.d_old), vec![0.0, 1.0]);
        assert_eq!(column(&records, |r| r.d_new), vec![0.0, 1.0]);
        assert!(records[0].a_old.is_nan());
        assert!(records.iter().all(|r| r.c_old.is_nan()));
    }

    #[test]
    fn test_undefined_snow_cover_aborts() {
        let obs = series("0", &[2.0, 2.0], &[0.0, 1.0], &[0.0, f64::NAN]);
        let err = compute_deficits(obs, 10.0).unwrap_err();
        match err {
            DeficitError::Precondition { site, violation } => {
                assert_eq!(site, "0");
                assert_eq!(
                    violation,
                    Violation::MissingField {
                        field: "snow_cover_fraction".to_string(),
                        date: NaiveDate::from_ymd_opt(2013, 1, 2).unwrap(),
                    }
                );
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_invalid_snow_frac_is_config_error() {
        let obs = series("0", &[1.0], &[0.0], &[0.0]);
        let err = compute_deficits(obs, 150.0).unwrap_err();
        assert!(matches!(err, DeficitError::Config(_)));
    }

    #[test]
    fn test_unordered_site_aborts_whole_run() {
        let mut obs = series("0", &[1.0, 1.0], &[0.0, 0.0], &[0.0, 0.0]);
        obs.extend(series("1", &[1.0, 1.0], &[0.0, 0.0], &[0.0, 0.0]));
        obs.swap(2, 3);
        let err = compute_deficits(obs, 10.0).unwrap_err();
        match err {
            DeficitError::Precondition { site, violation } => {
                assert_eq!(site, "1");
                assert!(matches!(violation, Violation::Unordered { .. }));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_policy_accessors() {
        let obs = series("0", &[2.0, 2.0], &[0.0, 0.0], &[0.0, 50.0]);
        let records = compute_deficits(obs, 10.0).unwrap();
        let last = &records[1];
        assert_eq!(last.demand(Policy::Original), 2.0);
        assert_eq!(last.demand(Policy::SnowAccounting), 0.0);
        assert_eq!(last.deficit(Policy::Original), 2.0);
        assert_eq!(last.deficit(Policy::SnowAccounting), 0.0);
        assert_eq!(Policy::SnowAccounting.label(), "Snow-accounting Method");
    }
}
