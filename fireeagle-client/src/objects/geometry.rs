use serde::{Deserialize, Serialize};

use crate::error::{FireEagleError, Result};
use crate::parser::{ParsedNode, TEXT_PROPERTY};

/// Spatial extent of a location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    /// `georss:point`: `"lat lon"`.
    Point { latitude: f64, longitude: f64 },
    /// `georss:box`: `"min_lat min_lon max_lat max_lon"`; the center is the mean of each pair.
    Box {
        min_lat: f64,
        min_lon: f64,
        max_lat: f64,
        max_lon: f64,
    },
}

impl Geometry {
    pub fn latitude(&self) -> f64 {
        match *self {
            Self::Point { latitude, .. } => latitude,
            Self::Box {
                min_lat, max_lat, ..
            } => (min_lat + max_lat) / 2.0,
        }
    }

    pub fn longitude(&self) -> f64 {
        match *self {
            Self::Point { longitude, .. } => longitude,
            Self::Box {
                min_lon, max_lon, ..
            } => (min_lon + max_lon) / 2.0,
        }
    }

    /// Decode a `georss:*` element.
    pub fn from_node(node: &ParsedNode) -> Result<Self> {
        let text = node.get_string(TEXT_PROPERTY);
        let invalid = || {
            FireEagleError::internal(format!("Invalid text for {} : {text}", node.name()))
        };

        match node.name() {
            "georss:point" => match parse_numbers(text).as_deref() {
                Some(&[latitude, longitude]) => Ok(Self::Point {
                    latitude,
                    longitude,
                }),
                _ => Err(invalid()),
            },
            "georss:box" => match parse_numbers(text).as_deref() {
                Some(&[min_lat, min_lon, max_lat, max_lon]) => Ok(Self::Box {
                    min_lat,
                    min_lon,
                    max_lat,
                    max_lon,
                }),
                _ => Err(invalid()),
            },
            other => Err(FireEagleError::internal(format!(
                "Unhandled geometry: {other}"
            ))),
        }
    }
}

/// Whitespace-separated decimal numbers; `None` if any token is not a number.
fn parse_numbers(text: &str) -> Option<Vec<f64>> {
    text.split_whitespace().map(|t| t.parse().ok()).collect()
}
