//! Service-record archive

use crate::error::Result;
use crate::models::{ServiceRecord, YearMonth};
use crate::session::Session;
use crate::store::{Collection, SharedDocumentStore, Stored, DEFAULT_LIST_LIMIT};

pub struct ServiceArchive {
    records: Collection<ServiceRecord>,
    list_limit: usize,
}

impl ServiceArchive {
    pub fn new(store: SharedDocumentStore) -> Self {
        Self {
            records: Collection::new(store),
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }

    pub fn with_list_limit(mut self, limit: usize) -> Self {
        self.list_limit = limit;
        self
    }

    /// Most recent service first
    pub async fn list(&self) -> Result<Vec<Stored<ServiceRecord>>> {
        Ok(self.records.list("-date", self.list_limit).await?)
    }

    /// Records whose title, leader or songs contain `query`; blank lists everything
    pub async fn search(&self, query: &str) -> Result<Vec<Stored<ServiceRecord>>> {
        let mut records = self.list().await?;
        let query = query.trim();
        if !query.is_empty() {
            records.retain(|r| r.matches_query(query));
        }
        Ok(records)
    }

    /// Search results grouped by month, newest month first
    pub async fn by_month(&self, query: &str) -> Result<Vec<(YearMonth, Vec<Stored<ServiceRecord>>)>> {
        let mut groups: Vec<(YearMonth, Vec<Stored<ServiceRecord>>)> = Vec::new();
        for record in self.search(query).await? {
            let month = record.year_month();
            match groups.iter_mut().find(|(m, _)| *m == month) {
                Some((_, records)) => records.push(record),
                None => groups.push((month, vec![record])),
            }
        }
        groups.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(groups)
    }

    pub async fn create(&self, record: &ServiceRecord) -> Result<Stored<ServiceRecord>> {
        let stored = self.records.create(record).await?;
        tracing::info!(id = %stored.id, date = %stored.date, songs = stored.songs.len(), "Service archived");
        Ok(stored)
    }

    pub async fn update(&self, id: &str, record: &ServiceRecord) -> Result<Stored<ServiceRecord>> {
        Ok(self.records.update(id, record).await?)
    }

    /// Team leader only
    pub async fn delete(&self, session: &Session, id: &str) -> Result<()> {
        session.require_delete("delete service record")?;
        self.records.delete(id).await?;
        Ok(())
    }
}
