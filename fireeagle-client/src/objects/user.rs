use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::location::Location;
use crate::error::{FireEagleError, Result};
use crate::parser::ParsedNode;
use crate::utils::datetime::parse_timestamp;

/// One `<user>` record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub readable: bool,
    pub writable: bool,
    pub token: String,
    /// Raw `located-at` attribute: time of the last update.
    pub timestamp: String,
    pub timezone: String,
    /// `|`-delimited WOEIDs, coarse to fine.
    pub woeid_hierarchy: String,
    pub locations: Vec<Location>,
}

impl User {
    /// Decode a `<user>` element.
    pub fn from_node(node: &ParsedNode) -> Result<Self> {
        if node.name() != "user" {
            return Err(FireEagleError::internal(format!(
                "Expected element = user. Got: {}",
                node.name()
            )));
        }

        let mut user = Self {
            readable: node.get_bool("readable").0,
            writable: node.get_bool("writable").0,
            token: node.get_string("token").to_string(),
            timestamp: node.get_string("located-at").to_string(),
            ..Self::default()
        };
        for hierarchy in node.children_named("location-hierarchy") {
            user.woeid_hierarchy = hierarchy.get_string("string").to_string();
            user.timezone = hierarchy.get_string("timezone").to_string();
            for location in hierarchy.children_named("location") {
                user.locations.push(Location::from_node(location)?);
            }
        }
        Ok(user)
    }

    /// Time of the last location update, when it parses.
    pub fn located_at(&self) -> Option<DateTime<FixedOffset>> {
        parse_timestamp(&self.timestamp)
    }

    /// WOEIDs of the hierarchy, coarse to fine.
    pub fn woeid_hierarchy_levels(&self) -> Vec<&str> {
        self.woeid_hierarchy
            .split('|')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// The location flagged `best-guess`, if any.
    pub fn best_guess(&self) -> Option<&Location> {
        self.locations.iter().find(|l| l.best_guess)
    }
}
