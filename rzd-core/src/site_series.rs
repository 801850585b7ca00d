//! Per-site ordered sequences of observations.
//!
//! The deficit recurrence walks one site's days in order, so a
//! [`SiteSeries`] can only be built from a non-empty, strictly
//! date-increasing run of observations for a single site.

use crate::{
    error::{DeficitError, Result, Violation},
    observation::Observation,
    table::SiteId,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct SiteSeries {
    point: SiteId,
    observations: Vec<Observation>,
}

impl SiteSeries {
    /// Validate and wrap one site's observations.
    ///
    /// Observations belonging to another site are rejected as invalid format;
    /// ordering problems, duplicate dates and undefined snow cover are
    /// precondition violations.
    pub fn new(point: SiteId, observations: Vec<Observation>) -> Result<SiteSeries> {
        if observations.is_empty() {
            return Err(DeficitError::precondition(&point, Violation::EmptySeries));
        }
        if let Some(stray) = observations.iter().find(|o| o.point != point) {
            return Err(DeficitError::InvalidFormat(format!(
                "observation for site {} in series for site {}",
                stray.point, point
            )));
        }
        if let Some(undefined) = observations
            .iter()
            .find(|o| !o.snow_cover_fraction.is_finite())
        {
            return Err(DeficitError::precondition(
                &point,
                Violation::MissingField {
                    field: "snow_cover_fraction".to_string(),
                    date: undefined.date,
                },
            ));
        }
        for pair in observations.windows(2) {
            let (previous, date) = (pair[0].date, pair[1].date);
            if date == previous {
                return Err(DeficitError::precondition(&point, Violation::DuplicateDate(date)));
            }
            if date < previous {
                return Err(DeficitError::precondition(
                    &point,
                    Violation::Unordered { previous, date },
                ));
            }
        }
        Ok(SiteSeries {
            point,
            observations,
        })
    }

    pub fn point(&self) -> &SiteId {
        &self.point
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.observations[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.observations[self.observations.len() - 1].date
    }

    /// Calendar days between the first and last observation that have no row.
    pub fn missing_dates(&self) -> Vec<NaiveDate> {
        let mut present = self.observations.iter().map(|o| o.date).peekable();
        let last = self.last_date();
        self.first_date()
            .iter_days()
            .take_while(|d| *d <= last)
            .filter(|d| {
                if present.peek() == Some(d) {
                    present.next();
                    false
                } else {
                    true
                }
            })
            .collect()
    }

    /// Split a flat observation list into one series per site, in site order.
    ///
    /// Row order within a site is preserved, never re-sorted; an out-of-order
    /// site fails validation rather than being silently repaired.
    pub fn group_by_site(observations: Vec<Observation>) -> Result<Vec<SiteSeries>> {
        let mut grouped: BTreeMap<SiteId, Vec<Observation>> = BTreeMap::new();
        for obs in observations {
            grouped.entry(obs.point.clone()).or_default().push(obs);
        }
        grouped
            .into_iter()
            .map(|(point, observations)| SiteSeries::new(point, observations))
            .collect()
    }
}
