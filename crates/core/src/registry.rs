//! Entry registry for the two-level action/data cache model
//!
//! Every `put` in the cache log records an action entry (the result of a
//! build step) that points at a data entry (the output blob). Many actions
//! may share one data entry, so entries live in an arena owned by the
//! [`Registry`] and refer to each other by [`EntryId`].

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Byte size attributed to every action entry.
///
/// Action records are small fixed-size files in the cache; this is the
/// historical size used when the statistics were first gathered.
pub const ACTION_ENTRY_SIZE: i64 = 154;

/// Which half of the cache an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Action record keyed by the action hash
    Action,
    /// Output blob keyed by the content hash
    Data,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Action => "action",
            Self::Data => "data",
        };
        write!(f, "{s}")
    }
}

/// Composite registry key: the raw identifier from the log plus its role
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryKey {
    /// Identifier as written in the log
    pub id: String,
    /// Role discriminator
    pub role: Role,
}

impl EntryKey {
    /// Key for an action entry
    #[must_use]
    pub fn action(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Action,
        }
    }

    /// Key for a data entry
    #[must_use]
    pub fn data(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Data,
        }
    }
}

/// Index of an entry inside a [`Registry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(usize);

/// Role-specific part of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Action entry and the data entry it produced
    Action {
        /// The associated data entry
        data: EntryId,
    },
    /// Data blob
    Data,
}

/// A single cache entry observed in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Timestamp of the put that created the entry
    pub created: i64,
    /// Bytes attributed to the entry
    pub size: i64,
    /// Set once the entry has been read back
    pub reused: bool,
    /// Timestamp of the most recent reuse, when since-last-reuse tracking is on
    pub last_reused: Option<i64>,
    /// Action or data specifics
    pub kind: EntryKind,
}

impl Entry {
    /// New data entry
    #[must_use]
    pub const fn data(created: i64, size: i64) -> Self {
        Self {
            created,
            size,
            reused: false,
            last_reused: None,
            kind: EntryKind::Data,
        }
    }

    /// New action entry pointing at `data`
    #[must_use]
    pub const fn action(created: i64, data: EntryId) -> Self {
        Self {
            created,
            size: ACTION_ENTRY_SIZE,
            reused: false,
            last_reused: None,
            kind: EntryKind::Action { data },
        }
    }

    /// Role of the entry
    #[must_use]
    pub const fn role(&self) -> Role {
        match self.kind {
            EntryKind::Action { .. } => Role::Action,
            EntryKind::Data => Role::Data,
        }
    }

    /// Data entry referenced by an action entry
    #[must_use]
    pub const fn data_id(&self) -> Option<EntryId> {
        match self.kind {
            EntryKind::Action { data } => Some(data),
            EntryKind::Data => None,
        }
    }

    /// Mark the entry as reused.
    ///
    /// Returns the entry size on the first call and `None` afterwards, so
    /// callers credit reused bytes exactly once.
    pub fn mark_reused(&mut self) -> Option<i64> {
        if self.reused {
            None
        } else {
            self.reused = true;
            Some(self.size)
        }
    }

    /// Latency since the previous reuse (or creation), then record `now` as
    /// the latest reuse. Wraps on overflow.
    pub fn advance_last_reused(&mut self, now: i64) -> i64 {
        let since = now.wrapping_sub(self.last_reused.unwrap_or(self.created));
        self.last_reused = Some(now);
        since
    }
}

/// Arena of entries with a first-write-wins key index
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<Entry>,
    index: HashMap<EntryKey, EntryId>,
}

impl Registry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entry id by key
    #[must_use]
    pub fn lookup(&self, key: &EntryKey) -> Option<EntryId> {
        self.index.get(key).copied()
    }

    /// Return the id for `key`, inserting `make()` when the key is new.
    ///
    /// The boolean is `true` only when a new entry was inserted. An existing
    /// entry is never modified.
    pub fn get_or_insert_with(
        &mut self,
        key: EntryKey,
        make: impl FnOnce() -> Entry,
    ) -> (EntryId, bool) {
        if let Some(id) = self.index.get(&key) {
            return (*id, false);
        }
        let id = EntryId(self.entries.len());
        self.entries.push(make());
        self.index.insert(key, id);
        (id, true)
    }

    /// Borrow an entry.
    ///
    /// Ids are only handed out by this registry, so lookups always succeed.
    #[must_use]
    pub fn get(&self, id: EntryId) -> &Entry {
        &self.entries[id.0]
    }

    /// Mutably borrow an entry
    pub fn get_mut(&mut self, id: EntryId) -> &mut Entry {
        &mut self.entries[id.0]
    }

    /// Number of entries with the given role
    #[must_use]
    pub fn count(&self, role: Role) -> usize {
        self.entries.iter().filter(|e| e.role() == role).count()
    }

    /// Total number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
