//! Member directory

use chrono::{Datelike, NaiveDate};

use crate::error::Result;
use crate::models::{Member, Position, PositionGroup, EXECUTIVE_ROLES};
use crate::session::Session;
use crate::store::{Collection, SharedDocumentStore, Stored, DEFAULT_LIST_LIMIT};

/// Search over the directory; empty fields match everyone
#[derive(Debug, Clone, Default)]
pub struct MemberQuery {
    pub name: Option<String>,
    pub position: Option<Position>,
}

impl MemberQuery {
    pub fn matches(&self, member: &Member) -> bool {
        let name_ok = self
            .name
            .as_deref()
            .map(|q| member.name.to_lowercase().contains(&q.to_lowercase()))
            .unwrap_or(true);
        let position_ok = self.position.map(|p| member.holds(p)).unwrap_or(true);
        name_ok && position_ok
    }
}

/// Members split by the kind of position they hold
///
/// A member with both an instrument and a singer position appears in both
/// lists. `other` only holds members with no instrument or singer position.
#[derive(Debug, Clone, Default)]
pub struct GroupedMembers {
    pub instrument: Vec<Stored<Member>>,
    pub singer: Vec<Stored<Member>>,
    pub other: Vec<Stored<Member>>,
}

impl GroupedMembers {
    pub fn from_members(members: &[Stored<Member>]) -> Self {
        let mut groups = Self::default();
        for member in members {
            let instrument = member.has_group(PositionGroup::Instrument);
            let singer = member.has_group(PositionGroup::Singer);
            if instrument {
                groups.instrument.push(member.clone());
            }
            if singer {
                groups.singer.push(member.clone());
            }
            if !instrument && !singer && member.has_group(PositionGroup::Other) {
                groups.other.push(member.clone());
            }
        }
        groups
    }
}

/// An executive for a year with the role they hold
#[derive(Debug, Clone)]
pub struct Executive {
    pub role: String,
    pub member: Stored<Member>,
}

pub struct MemberDirectory {
    members: Collection<Member>,
    list_limit: usize,
}

impl MemberDirectory {
    pub fn new(store: SharedDocumentStore) -> Self {
        Self {
            members: Collection::new(store),
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }

    pub fn with_list_limit(mut self, limit: usize) -> Self {
        self.list_limit = limit;
        self
    }

    /// All members ordered by name
    pub async fn list(&self) -> Result<Vec<Stored<Member>>> {
        Ok(self.members.list("name", self.list_limit).await?)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Stored<Member>>> {
        Ok(self.members.get(id).await?)
    }

    pub async fn search(&self, query: &MemberQuery) -> Result<Vec<Stored<Member>>> {
        let mut members = self.list().await?;
        members.retain(|m| query.matches(m));
        Ok(members)
    }

    pub async fn grouped(&self, query: &MemberQuery) -> Result<GroupedMembers> {
        Ok(GroupedMembers::from_members(&self.search(query).await?))
    }

    /// Members holding any role in `year`, in the usual role order
    pub async fn executives(&self, year: i32) -> Result<Vec<Executive>> {
        let rank = |role: &str| {
            EXECUTIVE_ROLES
                .iter()
                .position(|r| *r == role)
                .unwrap_or(EXECUTIVE_ROLES.len())
        };

        let mut executives: Vec<Executive> = self
            .list()
            .await?
            .into_iter()
            .flat_map(|member| {
                let roles: Vec<String> =
                    member.roles_in(year).into_iter().map(str::to_string).collect();
                roles.into_iter().map(move |role| Executive {
                    role,
                    member: member.clone(),
                })
            })
            .collect();

        executives.sort_by_key(|e| rank(&e.role));
        Ok(executives)
    }

    /// Members whose birthday falls on the month and day of `date`
    pub async fn birthdays_on(&self, date: NaiveDate) -> Result<Vec<Stored<Member>>> {
        let mut members = self.list().await?;
        members.retain(|m| m.has_birthday_on(date));
        Ok(members)
    }

    /// Members with a birthday in `date`'s month, by day
    pub async fn birthdays_in_month(&self, date: NaiveDate) -> Result<Vec<Stored<Member>>> {
        let mut members: Vec<_> = self
            .list()
            .await?
            .into_iter()
            .filter(|m| m.birthday.map(|b| b.month() == date.month()).unwrap_or(false))
            .collect();
        members.sort_by_key(|m| m.birthday.map(|b| b.day()));
        Ok(members)
    }

    pub async fn create(&self, member: &Member) -> Result<Stored<Member>> {
        let stored = self.members.create(member).await?;
        tracing::info!(id = %stored.id, name = %stored.name, "Member added");
        Ok(stored)
    }

    pub async fn update(&self, id: &str, member: &Member) -> Result<Stored<Member>> {
        Ok(self.members.update(id, member).await?)
    }

    /// Team leader only
    pub async fn delete(&self, session: &Session, id: &str) -> Result<()> {
        session.require_delete("delete member")?;
        self.members.delete(id).await?;
        tracing::info!(id, "Member removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::create_memory_store;

    async fn directory() -> MemberDirectory {
        let directory = MemberDirectory::new(create_memory_store());
        for member in [
            Member::new("Park")
                .with_position(Position::Engineer)
                .with_role(2025, "총무"),
            Member::new("Kim")
                .with_position(Position::Drums)
                .with_position(Position::MaleSinger)
                .with_role(2025, "팀장")
                .with_birthday(NaiveDate::from_ymd_opt(1995, 3, 14).unwrap()),
            Member::new("Lee").with_position(Position::FemaleSinger),
        ] {
            directory.create(&member).await.unwrap();
        }
        directory
    }

    #[tokio::test]
    async fn test_list_sorted_by_name() {
        let names: Vec<_> = directory()
            .await
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.value.name)
            .collect();
        assert_eq!(names, vec!["Kim", "Lee", "Park"]);
    }

    #[tokio::test]
    async fn test_search_combines_name_and_position() {
        let directory = directory().await;
        let query = MemberQuery {
            name: Some("k".to_string()),
            position: Some(Position::Drums),
        };
        let found = directory.search(&query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Kim");
    }

    #[tokio::test]
    async fn test_grouping() {
        let groups = directory()
            .await
            .grouped(&MemberQuery::default())
            .await
            .unwrap();
        assert_eq!(groups.instrument.len(), 1);
        assert_eq!(groups.singer.len(), 2);
        assert_eq!(groups.other.len(), 1);
        assert_eq!(groups.other[0].name, "Park");
    }

    #[tokio::test]
    async fn test_executives_in_role_order() {
        let executives = directory().await.executives(2025).await.unwrap();
        let roles: Vec<_> = executives.iter().map(|e| e.role.as_str()).collect();
        assert_eq!(roles, vec!["팀장", "총무"]);
        assert!(directory().await.executives(2024).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_birthdays() {
        let directory = directory().await;
        let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert_eq!(directory.birthdays_on(today).await.unwrap().len(), 1);
        assert_eq!(directory.birthdays_in_month(today).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_requires_leader() {
        let directory = directory().await;
        let id = directory.list().await.unwrap()[0].id.clone();

        let err = directory
            .delete(&Session::anonymous(), &id)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::Session(_)));
        assert_eq!(directory.list().await.unwrap().len(), 3);
    }
}
