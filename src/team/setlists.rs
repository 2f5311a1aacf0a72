//! Weekly set-lists
//!
//! Set-lists are labelled with [`setlist_week_number`], which numbers weeks
//! differently from the service roster. The two are kept separate on purpose.

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{RosterStatus, SetlistSong, WeeklySetlist, YearMonth};
use crate::scheduler::setlist_week_number;
use crate::session::Session;
use crate::store::{criteria, Collection, SharedDocumentStore, Stored};

/// Editable part of a set-list; the month bucket and week are derived
#[derive(Debug, Clone, Default)]
pub struct SetlistDraft {
    pub worship_leader: String,
    pub songs: Vec<SetlistSong>,
    pub practice_notes: String,
    pub status: RosterStatus,
}

impl SetlistDraft {
    /// Songs without a title and links without a URL are dropped
    fn into_setlist(self, date: NaiveDate) -> WeeklySetlist {
        let songs = self
            .songs
            .into_iter()
            .filter(|s| !s.title.trim().is_empty())
            .map(|mut s| {
                s.reference_links.retain(|l| !l.is_blank());
                s
            })
            .collect();

        WeeklySetlist {
            date,
            worship_leader: self.worship_leader,
            songs,
            practice_notes: self.practice_notes,
            status: self.status,
            year_month: YearMonth::from_date(date),
            week_number: setlist_week_number(date),
        }
    }
}

pub struct SetlistPlanner {
    setlists: Collection<WeeklySetlist>,
}

impl SetlistPlanner {
    pub fn new(store: SharedDocumentStore) -> Self {
        Self {
            setlists: Collection::new(store),
        }
    }

    pub async fn create(&self, date: NaiveDate, draft: SetlistDraft) -> Result<Stored<WeeklySetlist>> {
        let stored = self.setlists.create(&draft.into_setlist(date)).await?;
        tracing::info!(
            id = %stored.id,
            date = %date,
            week = stored.week_number,
            "Set-list created"
        );
        Ok(stored)
    }

    /// Replace a set-list; moving it to another date rederives its week
    pub async fn update(
        &self,
        id: &str,
        date: NaiveDate,
        draft: SetlistDraft,
    ) -> Result<Stored<WeeklySetlist>> {
        Ok(self.setlists.update(id, &draft.into_setlist(date)).await?)
    }

    /// Set-lists in a month, by week number then date
    pub async fn for_month(&self, year_month: YearMonth) -> Result<Vec<Stored<WeeklySetlist>>> {
        let mut setlists = self
            .setlists
            .filter(&criteria([("year_month", serde_json::json!(year_month))]))
            .await?;
        setlists.sort_by_key(|s| (s.week_number, s.date));
        Ok(setlists)
    }

    /// Team leader only
    pub async fn delete(&self, session: &Session, id: &str) -> Result<()> {
        session.require_delete("delete set-list")?;
        self.setlists.delete(id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::create_memory_store;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft(leader: &str) -> SetlistDraft {
        SetlistDraft {
            worship_leader: leader.to_string(),
            songs: vec![SetlistSong::new("How Great Is Our God")],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_stamps_bucket_and_week() {
        let planner = SetlistPlanner::new(create_memory_store());
        let stored = planner.create(ymd(2024, 6, 9), draft("Kim")).await.unwrap();
        assert_eq!(stored.year_month.to_string(), "2024-06");
        assert_eq!(stored.week_number, 3);
    }

    #[tokio::test]
    async fn test_for_month_sorted_by_week() {
        let planner = SetlistPlanner::new(create_memory_store());
        planner.create(ymd(2024, 6, 16), draft("Lee")).await.unwrap();
        planner.create(ymd(2024, 6, 2), draft("Kim")).await.unwrap();
        planner.create(ymd(2024, 7, 7), draft("Park")).await.unwrap();

        let june = planner
            .for_month(YearMonth::new(2024, 6).unwrap())
            .await
            .unwrap();
        let weeks: Vec<_> = june.iter().map(|s| s.week_number).collect();
        assert_eq!(weeks, vec![2, 4]);
    }

    #[tokio::test]
    async fn test_update_moves_bucket() {
        let planner = SetlistPlanner::new(create_memory_store());
        let stored = planner.create(ymd(2024, 6, 30), draft("Kim")).await.unwrap();
        let moved = planner
            .update(&stored.id, ymd(2024, 7, 7), draft("Kim"))
            .await
            .unwrap();
        assert_eq!(moved.year_month.to_string(), "2024-07");
        assert_eq!(moved.week_number, 2);
    }

    #[tokio::test]
    async fn test_blank_songs_and_links_dropped() {
        let planner = SetlistPlanner::new(create_memory_store());
        let draft = SetlistDraft {
            worship_leader: "Lee".to_string(),
            songs: vec![
                SetlistSong::new("Way Maker")
                    .with_link("YouTube", "https://youtu.be/abc")
                    .with_link("", ""),
                SetlistSong::new("  "),
            ],
            ..Default::default()
        };

        let stored = planner.create(ymd(2024, 6, 2), draft).await.unwrap();
        assert_eq!(stored.songs.len(), 1);
        assert_eq!(stored.songs[0].reference_links.len(), 1);
        assert_eq!(stored.songs[0].links().count(), 1);
    }
}
