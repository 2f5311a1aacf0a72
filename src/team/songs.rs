//! Song library

use crate::error::Result;
use crate::models::Song;
use crate::session::Session;
use crate::store::{Collection, SharedDocumentStore, Stored, DEFAULT_LIST_LIMIT};

pub struct SongLibrary {
    songs: Collection<Song>,
    list_limit: usize,
}

impl SongLibrary {
    pub fn new(store: SharedDocumentStore) -> Self {
        Self {
            songs: Collection::new(store),
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }

    pub fn with_list_limit(mut self, limit: usize) -> Self {
        self.list_limit = limit;
        self
    }

    /// All songs by title
    pub async fn list(&self) -> Result<Vec<Stored<Song>>> {
        Ok(self.songs.list("title", self.list_limit).await?)
    }

    /// Songs whose title, artist or tags contain `query`; blank lists everything
    pub async fn search(&self, query: &str) -> Result<Vec<Stored<Song>>> {
        let mut songs = self.list().await?;
        let query = query.trim();
        if !query.is_empty() {
            songs.retain(|s| s.matches_query(query));
        }
        Ok(songs)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Stored<Song>>> {
        Ok(self.songs.get(id).await?)
    }

    pub async fn create(&self, song: &Song) -> Result<Stored<Song>> {
        let stored = self.songs.create(song).await?;
        tracing::info!(id = %stored.id, title = %stored.title, "Song added");
        Ok(stored)
    }

    pub async fn update(&self, id: &str, song: &Song) -> Result<Stored<Song>> {
        Ok(self.songs.update(id, song).await?)
    }

    /// Team leader only
    pub async fn delete(&self, session: &Session, id: &str) -> Result<()> {
        session.require_delete("delete song")?;
        self.songs.delete(id).await?;
        tracing::info!(id, "Song removed");
        Ok(())
    }
}
