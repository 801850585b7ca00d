//! Snow masking of evapotranspiration.
//!
//! Under snowpack the PML ET estimate is not trusted, so the snow-accounting
//! policy replaces it with zero on days whose snow cover exceeds a threshold.

use rzd_core::error::{DeficitError, Result};

/// Valid range of the MODIS NDSI snow cover field, in percent.
pub const SNOW_COVER_MIN: f64 = 0.0;
pub const SNOW_COVER_MAX: f64 = 100.0;

/// Snow cover above which ET is masked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnowThreshold(f64);

impl SnowThreshold {
    pub fn new(snow_frac: f64) -> Result<SnowThreshold> {
        if !snow_frac.is_finite() || !(SNOW_COVER_MIN..=SNOW_COVER_MAX).contains(&snow_frac) {
            return Err(DeficitError::Config(format!(
                "snow_frac {snow_frac} outside {SNOW_COVER_MIN}..={SNOW_COVER_MAX}"
            )));
        }
        Ok(SnowThreshold(snow_frac))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// ET under the snow-accounting policy.
    ///
    /// Strictly greater than the threshold masks; equal does not. Snow cover
    /// is checked to be defined when the site series is built.
    pub fn mask_et(&self, et: f64, snow_cover_fraction: f64) -> f64 {
        if snow_cover_fraction > self.0 {
            0.0
        } else {
            et
        }
    }
}

/// True on days the mask zeroed a non-zero ET.
pub fn is_snow_masked(et: f64, no_snow_et: f64) -> bool {
    no_snow_et == 0.0 && et != 0.0
}
