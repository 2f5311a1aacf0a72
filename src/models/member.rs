//! Team members, service positions and executive roles

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use super::{blank_as_none, blank_date_as_none};
use crate::store::Entity;

// ============================================================================
// Position
// ============================================================================

/// A serving role on the worship team
///
/// Serialized with the Korean label the team uses in its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "인도자")]
    WorshipLeader,
    #[serde(rename = "여성싱어")]
    FemaleSinger,
    #[serde(rename = "남성싱어")]
    MaleSinger,
    #[serde(rename = "드럼")]
    Drums,
    #[serde(rename = "메인건반")]
    MainKeys,
    #[serde(rename = "세컨건반")]
    SecondKeys,
    #[serde(rename = "일렉기타")]
    ElectricGuitar,
    #[serde(rename = "어쿠스틱기타")]
    AcousticGuitar,
    #[serde(rename = "베이스기타")]
    BassGuitar,
    #[serde(rename = "엔지니어")]
    Engineer,
}

/// Coarse grouping used by the member directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionGroup {
    Instrument,
    Singer,
    Other,
}

impl Position {
    /// All positions in roster display order
    pub fn all() -> Vec<Self> {
        vec![
            Self::WorshipLeader,
            Self::FemaleSinger,
            Self::MaleSinger,
            Self::Drums,
            Self::MainKeys,
            Self::SecondKeys,
            Self::ElectricGuitar,
            Self::AcousticGuitar,
            Self::BassGuitar,
            Self::Engineer,
        ]
    }

    /// Korean label (also the serialized form)
    pub fn korean_label(&self) -> &'static str {
        match self {
            Self::WorshipLeader => "인도자",
            Self::FemaleSinger => "여성싱어",
            Self::MaleSinger => "남성싱어",
            Self::Drums => "드럼",
            Self::MainKeys => "메인건반",
            Self::SecondKeys => "세컨건반",
            Self::ElectricGuitar => "일렉기타",
            Self::AcousticGuitar => "어쿠스틱기타",
            Self::BassGuitar => "베이스기타",
            Self::Engineer => "엔지니어",
        }
    }

    /// ASCII identifier, handy for URLs and CLI arguments
    pub fn id(&self) -> &'static str {
        match self {
            Self::WorshipLeader => "leader",
            Self::FemaleSinger => "female_singer",
            Self::MaleSinger => "male_singer",
            Self::Drums => "drums",
            Self::MainKeys => "main_keys",
            Self::SecondKeys => "second_keys",
            Self::ElectricGuitar => "electric_guitar",
            Self::AcousticGuitar => "acoustic_guitar",
            Self::BassGuitar => "bass_guitar",
            Self::Engineer => "engineer",
        }
    }

    pub fn group(&self) -> PositionGroup {
        match self {
            Self::FemaleSinger | Self::MaleSinger => PositionGroup::Singer,
            Self::WorshipLeader | Self::Engineer => PositionGroup::Other,
            _ => PositionGroup::Instrument,
        }
    }

    /// Whether a roster may put several people on this position
    pub fn allows_multiple(&self) -> bool {
        self.group() == PositionGroup::Singer
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.korean_label())
    }
}

/// Error for unknown position names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown position '{0}'")]
pub struct UnknownPosition(pub String);

impl FromStr for Position {
    type Err = UnknownPosition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::all()
            .into_iter()
            .find(|p| p.korean_label() == needle || p.id().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownPosition(s.to_string()))
    }
}

// ============================================================================
// Executive Role
// ============================================================================

/// Role name of the team leader
pub const TEAM_LEADER_ROLE: &str = "팀장";

/// Executive roles the team elects each year
pub const EXECUTIVE_ROLES: [&str; 5] = ["팀장", "파트장", "총무", "회계", "서기"];

/// An executive role held in a given year
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutiveRole {
    pub year: i32,
    pub role: String,
}

impl ExecutiveRole {
    pub fn new(year: i32, role: impl Into<String>) -> Self {
        Self {
            year,
            role: role.into(),
        }
    }
}

// ============================================================================
// Member
// ============================================================================

fn default_active() -> bool {
    true
}

/// A worship-team member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,

    #[serde(default)]
    pub positions: Vec<Position>,

    #[serde(default)]
    pub executive_roles: Vec<ExecutiveRole>,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub phone: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "blank_date_as_none")]
    pub birthday: Option<NaiveDate>,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl Member {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            positions: Vec::new(),
            executive_roles: Vec::new(),
            phone: None,
            email: None,
            birthday: None,
            is_active: true,
        }
    }

    /// Add a position (ignored if already held)
    pub fn with_position(mut self, position: Position) -> Self {
        if !self.positions.contains(&position) {
            self.positions.push(position);
        }
        self
    }

    /// Add an executive role (ignored if the same entry exists)
    pub fn with_role(mut self, year: i32, role: impl Into<String>) -> Self {
        let role = ExecutiveRole::new(year, role);
        if !self.executive_roles.contains(&role) {
            self.executive_roles.push(role);
        }
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_birthday(mut self, birthday: NaiveDate) -> Self {
        self.birthday = Some(birthday);
        self
    }

    pub fn holds(&self, position: Position) -> bool {
        self.positions.contains(&position)
    }

    /// Roles held in `year`
    pub fn roles_in(&self, year: i32) -> Vec<&str> {
        self.executive_roles
            .iter()
            .filter(|r| r.year == year)
            .map(|r| r.role.as_str())
            .collect()
    }

    pub fn is_team_leader_in(&self, year: i32) -> bool {
        self.executive_roles
            .iter()
            .any(|r| r.year == year && r.role == TEAM_LEADER_ROLE)
    }

    /// Whether the birthday falls on the month/day of `date`
    pub fn has_birthday_on(&self, date: NaiveDate) -> bool {
        self.birthday
            .map(|b| b.month() == date.month() && b.day() == date.day())
            .unwrap_or(false)
    }

    pub fn has_group(&self, group: PositionGroup) -> bool {
        self.positions.iter().any(|p| p.group() == group)
    }
}

impl Entity for Member {
    const COLLECTION: &'static str = "members";

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("member name must not be blank".to_string());
        }

        let mut seen = HashSet::new();
        if let Some(dup) = self.positions.iter().find(|p| !seen.insert(**p)) {
            return Err(format!("position '{dup}' listed twice"));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = self.executive_roles.iter().find(|r| !seen.insert(*r)) {
            return Err(format!("role '{}' ({}) listed twice", dup.role, dup.year));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_serializes_korean() {
        let json = serde_json::to_string(&Position::Drums).unwrap();
        assert_eq!(json, "\"드럼\"");
        let back: Position = serde_json::from_str("\"베이스기타\"").unwrap();
        assert_eq!(back, Position::BassGuitar);
    }

    #[test]
    fn test_position_from_str_accepts_both_forms() {
        assert_eq!("드럼".parse::<Position>().unwrap(), Position::Drums);
        assert_eq!("DRUMS".parse::<Position>().unwrap(), Position::Drums);
        assert!("보컬".parse::<Position>().is_err());
    }

    #[test]
    fn test_position_groups() {
        assert_eq!(Position::FemaleSinger.group(), PositionGroup::Singer);
        assert_eq!(Position::Engineer.group(), PositionGroup::Other);
        assert_eq!(Position::MainKeys.group(), PositionGroup::Instrument);
        assert!(Position::MaleSinger.allows_multiple());
        assert!(!Position::Drums.allows_multiple());
    }

    #[test]
    fn test_team_leader_is_year_scoped() {
        let member = Member::new("Kim").with_role(2023, "팀장").with_role(2024, "총무");
        assert!(member.is_team_leader_in(2023));
        assert!(!member.is_team_leader_in(2024));
        assert_eq!(member.roles_in(2024), vec!["총무"]);
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let mut member = Member::new("Kim").with_position(Position::Drums);
        member.positions.push(Position::Drums);
        assert!(member.validate().is_err());

        let mut member = Member::new("Lee").with_role(2024, "서기");
        member.executive_roles.push(ExecutiveRole::new(2024, "서기"));
        assert!(member.validate().is_err());

        assert!(Member::new("  ").validate().is_err());
    }

    #[test]
    fn test_blank_fields_decode_as_none() {
        let member: Member = serde_json::from_value(serde_json::json!({
            "name": "Park",
            "positions": ["드럼"],
            "phone": "",
            "birthday": ""
        }))
        .unwrap();
        assert!(member.phone.is_none());
        assert!(member.birthday.is_none());
        assert!(member.is_active);
    }

    #[test]
    fn test_birthday_match_ignores_year() {
        let member = Member::new("Choi").with_birthday(NaiveDate::from_ymd_opt(1995, 6, 2).unwrap());
        assert!(member.has_birthday_on(NaiveDate::from_ymd_opt(2024, 6, 2).unwrap()));
        assert!(!member.has_birthday_on(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()));
    }
}
