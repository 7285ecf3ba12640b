//! Per-session show collections: favorites, watchlist and recently viewed.
//!
//! Every operation is total. Shows are stored as given; nothing is validated.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::models::{Show, ShowId};

/// Number of entries kept in the recently viewed history
pub const RECENTLY_VIEWED_CAPACITY: usize = 10;

/// Shared handle to the single library instance of the process
pub type LibraryHandle = Arc<RwLock<Library>>;

/// Insertion-ordered set of shows keyed by id
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ShowSet {
    shows: Vec<Show>,
}

impl ShowSet {
    /// Adds the show unless one with the same id is present. Returns whether it was added.
    pub fn insert(&mut self, show: Show) -> bool {
        if self.contains(show.id) {
            return false;
        }
        self.shows.push(show);
        true
    }

    /// Removes the show with `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: ShowId) -> bool {
        let before = self.shows.len();
        self.shows.retain(|show| show.id != id);
        self.shows.len() != before
    }

    pub fn contains(&self, id: ShowId) -> bool {
        self.shows.iter().any(|show| show.id == id)
    }

    pub fn as_slice(&self) -> &[Show] {
        &self.shows
    }

    pub fn len(&self) -> usize {
        self.shows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shows.is_empty()
    }
}

/// Bounded history, most recent first, at most one entry per id
#[derive(Debug, Clone, Serialize)]
pub struct RecentlyViewed {
    shows: VecDeque<Show>,
    #[serde(skip)]
    capacity: usize,
}

impl Default for RecentlyViewed {
    fn default() -> Self {
        Self::with_capacity(RECENTLY_VIEWED_CAPACITY)
    }
}

impl RecentlyViewed {
    /// History holding at most `capacity` shows; never less than one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            shows: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Moves the show to the front, dropping any older entry with the same id
    /// and evicting from the tail beyond capacity.
    pub fn record(&mut self, show: Show) {
        self.shows.retain(|existing| existing.id != show.id);
        self.shows.push_front(show);
        if self.shows.len() > self.capacity {
            let evicted = self.shows.len() - self.capacity;
            self.shows.truncate(self.capacity);
            tracing::debug!(evicted, capacity = self.capacity, "Recently viewed history truncated");
        }
    }

    pub fn clear(&mut self) {
        self.shows.clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.shows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Show> {
        self.shows.iter()
    }

    pub fn to_vec(&self) -> Vec<Show> {
        self.shows.iter().cloned().collect()
    }
}

/// The three independent collections of a session
#[derive(Debug, Clone, Default)]
pub struct Library {
    favorites: ShowSet,
    watchlist: ShowSet,
    recently_viewed: RecentlyViewed,
}

impl Library {
    /// Creates an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty library whose history keeps at most `capacity` shows
    pub fn with_history_capacity(capacity: usize) -> Self {
        Self {
            recently_viewed: RecentlyViewed::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Wraps the library in the shared handle passed to consumers
    pub fn into_handle(self) -> LibraryHandle {
        Arc::new(RwLock::new(self))
    }

    pub fn add_favorite(&mut self, show: Show) {
        let id = show.id;
        if self.favorites.insert(show) {
            tracing::debug!(show_id = %id, "Added to favorites");
        }
    }

    pub fn remove_favorite(&mut self, id: ShowId) {
        if self.favorites.remove(id) {
            tracing::debug!(show_id = %id, "Removed from favorites");
        }
    }

    pub fn is_favorite(&self, id: ShowId) -> bool {
        self.favorites.contains(id)
    }

    pub fn favorites(&self) -> &[Show] {
        self.favorites.as_slice()
    }

    pub fn add_watchlist(&mut self, show: Show) {
        let id = show.id;
        if self.watchlist.insert(show) {
            tracing::debug!(show_id = %id, "Added to watchlist");
        }
    }

    pub fn remove_watchlist(&mut self, id: ShowId) {
        if self.watchlist.remove(id) {
            tracing::debug!(show_id = %id, "Removed from watchlist");
        }
    }

    pub fn is_in_watchlist(&self, id: ShowId) -> bool {
        self.watchlist.contains(id)
    }

    pub fn watchlist(&self) -> &[Show] {
        self.watchlist.as_slice()
    }

    pub fn add_recently_viewed(&mut self, show: Show) {
        tracing::debug!(show_id = %show.id, "Recorded view");
        self.recently_viewed.record(show);
    }

    /// Empties the history. Confirmation is the caller's concern.
    pub fn clear_recently_viewed(&mut self) {
        tracing::debug!(cleared = self.recently_viewed.len(), "Cleared recently viewed");
        self.recently_viewed.clear();
    }

    pub fn recently_viewed(&self) -> &RecentlyViewed {
        &self.recently_viewed
    }
}
