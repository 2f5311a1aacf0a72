//! Service rosters: who serves which position on a given date

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::{EventType, Position};
use crate::store::Entity;

/// Draft/confirmed lifecycle shared by rosters and set-lists
///
/// `Confirmed` can be re-entered freely; nothing locks a confirmed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RosterStatus {
    #[default]
    Draft,
    Confirmed,
}

impl RosterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Confirmed => "confirmed",
        }
    }

    pub fn korean_label(&self) -> &'static str {
        match self {
            Self::Draft => "미확정",
            Self::Confirmed => "확정",
        }
    }
}

impl fmt::Display for RosterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RosterStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "confirmed" => Ok(Self::Confirmed),
            other => Err(format!("unknown roster status '{other}'")),
        }
    }
}

/// Member name(s) assigned to a position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Assignment {
    Single(String),
    Multiple(Vec<String>),
}

impl Assignment {
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::Single(name) => vec![name.as_str()],
            Self::Multiple(names) => names.iter().map(String::as_str).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().contains(&name)
    }

    /// True for an empty name or an empty list
    pub fn is_empty(&self) -> bool {
        self.names().iter().all(|n| n.trim().is_empty())
    }
}

impl From<&str> for Assignment {
    fn from(name: &str) -> Self {
        Self::Single(name.to_string())
    }
}

impl From<String> for Assignment {
    fn from(name: String) -> Self {
        Self::Single(name)
    }
}

impl From<Vec<String>> for Assignment {
    fn from(names: Vec<String>) -> Self {
        Self::Multiple(names)
    }
}

/// Position-to-member mapping for one date
pub type Assignments = BTreeMap<Position, Assignment>;

/// Decode an assignment map where a `null` slot, or a `null` map, means
/// nobody is assigned
pub fn deserialize_assignments<'de, D>(deserializer: D) -> Result<Assignments, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<Position, Option<Assignment>>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(position, assignment)| assignment.map(|a| (position, a)))
        .collect())
}

/// The roster for one service date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterRecord {
    pub date: NaiveDate,

    #[serde(default)]
    pub event_type: EventType,

    #[serde(default, deserialize_with = "deserialize_assignments")]
    pub assignments: Assignments,

    #[serde(default)]
    pub status: RosterStatus,
}

impl RosterRecord {
    pub fn new(date: NaiveDate, assignments: Assignments, status: RosterStatus) -> Self {
        Self {
            date,
            event_type: EventType::SundayWorship,
            assignments,
            status,
        }
    }

    pub fn assigned(&self, position: Position) -> Option<&Assignment> {
        self.assignments.get(&position)
    }

    /// Positions with nobody on them, in display order
    pub fn unfilled_positions(&self) -> Vec<Position> {
        Position::all()
            .into_iter()
            .filter(|p| self.assigned(*p).map(Assignment::is_empty).unwrap_or(true))
            .collect()
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == RosterStatus::Confirmed
    }
}

impl Entity for RosterRecord {
    const COLLECTION: &'static str = "service_schedules";
}
