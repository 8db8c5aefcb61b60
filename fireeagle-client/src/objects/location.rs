use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::geometry::Geometry;
use crate::error::{FireEagleError, Result};
use crate::parser::{ParsedNode, TEXT_PROPERTY};
use crate::utils::datetime::parse_timestamp;

/// One `<location>` record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// `best-guess` attribute: the service's pick among a user's locations.
    pub best_guess: bool,
    pub label: String,
    /// Hierarchy level (0 = exact point ... country); `None` when absent or not numeric.
    pub level: Option<u32>,
    pub level_name: String,
    pub geometry: Option<Geometry>,
    /// Raw `located-at` text.
    pub timestamp: String,
    /// Full location string (`name`).
    pub full_location: String,
    /// Place name (`normal-name`).
    pub place_name: String,
    pub place_id: String,
    pub place_id_exact: bool,
    pub woeid: Option<u32>,
    pub woeid_exact: bool,
}

impl Location {
    /// Decode a `<location>` element.
    pub fn from_node(node: &ParsedNode) -> Result<Self> {
        if node.name() != "location" {
            return Err(FireEagleError::internal(format!(
                "Expected element = location. Got: {}",
                node.name()
            )));
        }

        let mut location = Self {
            best_guess: node.get_bool("best-guess").0,
            ..Self::default()
        };
        for child in node.children() {
            let text = || child.get_string(TEXT_PROPERTY).to_string();
            match child.name() {
                "label" => location.label = text(),
                "level" => location.level = unsigned_text(child),
                "level-name" => location.level_name = text(),
                "located-at" => location.timestamp = text(),
                "name" => location.full_location = text(),
                "normal-name" => location.place_name = text(),
                "place-id" => {
                    location.place_id = text();
                    location.place_id_exact = child.get_bool("exact-match").0;
                }
                "woeid" => {
                    location.woeid = unsigned_text(child);
                    location.woeid_exact = child.get_bool("exact-match").0;
                }
                name if name.starts_with("georss:") => {
                    location.geometry = Some(Geometry::from_node(child)?);
                }
                _ => {}
            }
        }
        Ok(location)
    }

    /// `located-at` as a date, when it parses.
    pub fn located_at(&self) -> Option<DateTime<FixedOffset>> {
        parse_timestamp(&self.timestamp)
    }
}

fn unsigned_text(node: &ParsedNode) -> Option<u32> {
    match node.get_long(TEXT_PROPERTY) {
        (value, true) => u32::try_from(value).ok(),
        _ => None,
    }
}
