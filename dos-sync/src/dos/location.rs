//! DoS postcode locations.

use serde::{Deserialize, Serialize};

use crate::domain::normalise_postcode;

/// A geocoded postcode from the DoS `locations` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DosLocation {
    pub id: i64,
    pub postcode: String,
    pub easting: Option<i64>,
    pub northing: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub postaltown: Option<String>,
}

impl DosLocation {
    /// True only when all four geo fields are present.
    pub fn is_valid(&self) -> bool {
        self.easting.is_some()
            && self.northing.is_some()
            && self.latitude.is_some()
            && self.longitude.is_some()
    }

    pub fn normal_postcode(&self) -> String {
        normalise_postcode(&self.postcode)
    }
}
