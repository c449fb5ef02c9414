use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, path::PathBuf};

/// Where a raw row comes from: its export file and data row within that file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Origin {
    pub file: PathBuf,
    pub row: usize,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} of {:?}", self.row, self.file)
    }
}

/// Row of a raw export, exactly as read from the CSV file.
///
/// Every field may be missing. Extra columns are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEntry {
    #[serde(rename = "Date", default)]
    pub date: Option<String>,

    #[serde(rename = "Latitude", default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(rename = "Longitude", default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,

    #[serde(rename = "Miles", default, deserialize_with = "lenient_f64")]
    pub miles: Option<f64>,
    #[serde(rename = "Car MPG", default, deserialize_with = "lenient_f64")]
    pub car_mpg: Option<f64>,
    #[serde(rename = "Real MPG", default, deserialize_with = "lenient_f64")]
    pub real_mpg: Option<f64>,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(skip)]
    pub origin: Origin,
}

/// Cleaned entry with a parsed date and a known location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub date: NaiveDate,

    pub latitude: f64,
    pub longitude: f64,

    pub miles: Option<f64>,
    pub car_mpg: Option<f64>,
    pub real_mpg: Option<f64>,

    pub notes: Option<String>,
}

/// Entry with every numeric field present, ready for analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub date: NaiveDate,
    pub miles: f64,
    pub car_mpg: f64,
    pub real_mpg: f64,
}

impl Sample {
    /// Build a [`Sample`] if none of the entry's numeric fields is missing.
    pub fn from_entry(entry: &Entry) -> Option<Self> {
        Some(Self {
            date: entry.date,
            miles: entry.miles?,
            car_mpg: entry.car_mpg?,
            real_mpg: entry.real_mpg?,
        })
    }

    /// Difference between the MPG reported by the car and the computed one.
    pub fn offset(&self) -> f64 {
        self.car_mpg - self.real_mpg
    }
}

/// Parse a numeric field, mapping empty, unparseable and NaN values to `None`.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let field: Option<String> = Option::deserialize(deserializer)?;
    Ok(field
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|val| !val.is_nan()))
}
