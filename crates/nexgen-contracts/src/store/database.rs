use std::marker::PhantomData;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::backend::StorageBackend;
use super::seed::{seed_projects, seed_users};
use crate::models::{Lead, LeadStatus, ProjectIdea, User};

pub const USERS_KEY: &str = "nexgen_db_users";
pub const LEADS_KEY: &str = "nexgen_db_leads";
pub const PROJECTS_KEY: &str = "nexgen_db_projects";
pub const SESSION_KEY: &str = "nexgen_session_user";

/// A document stored in one of the named collections.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const COLLECTION: &'static str;
    /// New records go to the front of the collection instead of the back.
    const PREPEND_NEW: bool;

    fn id(&self) -> &str;

    /// What a read yields when the collection is absent or unreadable.
    fn fallback() -> Vec<Self> {
        Vec::new()
    }
}

impl Record for User {
    const COLLECTION: &'static str = USERS_KEY;
    const PREPEND_NEW: bool = false;

    fn id(&self) -> &str {
        &self.id
    }

    fn fallback() -> Vec<Self> {
        seed_users()
    }
}

impl Record for Lead {
    const COLLECTION: &'static str = LEADS_KEY;
    const PREPEND_NEW: bool = true;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for ProjectIdea {
    const COLLECTION: &'static str = PROJECTS_KEY;
    const PREPEND_NEW: bool = true;

    fn id(&self) -> &str {
        &self.id
    }
}

pub trait Repository<T> {
    fn list(&self) -> Vec<T>;
    fn get(&self, id: &str) -> Option<T>;
    /// Replaces the record with the same id in place, or inserts it.
    /// Returns the collection as written.
    fn upsert(&self, record: T) -> anyhow::Result<Vec<T>>;
    /// Removing an id that is not present is not an error.
    fn delete(&self, id: &str) -> anyhow::Result<Vec<T>>;
}

/// A collection as loaded for a write. Stored entries that no longer decode
/// are kept aside verbatim and written back after the decoded records.
struct Snapshot<T> {
    records: Vec<T>,
    undecodable: Vec<Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub leads_created: bool,
    pub projects_seeded: bool,
    pub users_added: usize,
}

/// Synchronous read-modify-write helpers over the users, leads and projects
/// collections. Every write re-serializes the whole collection.
#[derive(Debug)]
pub struct LocalDatabase<B> {
    backend: B,
}

impl<B: StorageBackend> LocalDatabase<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Seeds missing collections and merges demo users by email. Safe to run
    /// any number of times; existing records are never overwritten.
    pub fn init(&self) -> anyhow::Result<SeedReport> {
        let mut report = SeedReport::default();

        if self.backend.read(LEADS_KEY)?.is_none() {
            self.write_collection::<Lead>(&[])?;
            report.leads_created = true;
        }

        if self.backend.read(PROJECTS_KEY)?.is_none() {
            self.write_collection(&seed_projects())?;
            report.projects_seeded = true;
        }

        let mut users = match self.backend.read(USERS_KEY)? {
            Some(_) => self.snapshot::<User>()?,
            None => Snapshot {
                records: Vec::new(),
                undecodable: Vec::new(),
            },
        };
        let was_empty = users.records.is_empty() && users.undecodable.is_empty();
        for seed in seed_users() {
            let known = users
                .records
                .iter()
                .any(|user| user.email.eq_ignore_ascii_case(&seed.email));
            if !known {
                users.records.push(seed);
                report.users_added += 1;
            }
        }
        if was_empty || report.users_added > 0 {
            self.save(&users)?;
        }

        tracing::debug!(?report, "local database initialised");
        Ok(report)
    }

    pub fn users(&self) -> Collection<'_, User, B> {
        Collection::new(self)
    }

    pub fn leads(&self) -> Collection<'_, Lead, B> {
        Collection::new(self)
    }

    pub fn projects(&self) -> Collection<'_, ProjectIdea, B> {
        Collection::new(self)
    }

    pub fn add_lead(&self, lead: Lead) -> anyhow::Result<Vec<Lead>> {
        let mut leads = self.snapshot::<Lead>()?;
        leads.records.insert(0, lead);
        self.save(&leads)?;
        Ok(leads.records)
    }

    /// Replaces a lead with the same id. Unknown ids leave the collection as is.
    pub fn update_lead(&self, lead: Lead) -> anyhow::Result<Vec<Lead>> {
        let mut leads = self.snapshot::<Lead>()?;
        if let Some(slot) = leads.records.iter_mut().find(|existing| existing.id == lead.id) {
            *slot = lead;
            self.save(&leads)?;
        }
        Ok(leads.records)
    }

    pub fn update_lead_status(&self, id: &str, status: LeadStatus) -> anyhow::Result<Option<Lead>> {
        let mut leads = self.snapshot::<Lead>()?;
        let Some(lead) = leads.records.iter_mut().find(|lead| lead.id == id) else {
            return Ok(None);
        };
        lead.status = status;
        let updated = lead.clone();
        self.save(&leads)?;
        Ok(Some(updated))
    }

    pub fn session_user(&self) -> Option<User> {
        let raw = self.backend.read(SESSION_KEY).ok()??;
        serde_json::from_str(&raw).ok()
    }

    pub fn set_session_user(&self, user: &User) -> anyhow::Result<()> {
        self.backend
            .write(SESSION_KEY, &serde_json::to_string(user)?)
    }

    pub fn clear_session(&self) -> anyhow::Result<()> {
        self.backend.remove(SESSION_KEY)
    }

    /// Loads a collection record by record. A missing collection yields its
    /// fallback; one that is not a JSON array is an error, so nothing gets
    /// written over it.
    fn snapshot<T: Record>(&self) -> anyhow::Result<Snapshot<T>> {
        let Some(raw) = self.backend.read(T::COLLECTION)? else {
            return Ok(Snapshot {
                records: T::fallback(),
                undecodable: Vec::new(),
            });
        };
        let entries: Vec<Value> = serde_json::from_str(&raw)
            .with_context(|| format!("stored collection {} is not a JSON array", T::COLLECTION))?;

        let mut snapshot = Snapshot {
            records: Vec::with_capacity(entries.len()),
            undecodable: Vec::new(),
        };
        for (index, entry) in entries.into_iter().enumerate() {
            match <T as serde::Deserialize>::deserialize(&entry) {
                Ok(record) => snapshot.records.push(record),
                Err(err) => {
                    tracing::warn!(collection = T::COLLECTION, index, error = %err, "skipping undecodable record");
                    snapshot.undecodable.push(entry);
                }
            }
        }
        Ok(snapshot)
    }

    fn read_collection<T: Record>(&self) -> Vec<T> {
        match self.snapshot() {
            Ok(snapshot) => snapshot.records,
            Err(err) => {
                tracing::warn!(collection = T::COLLECTION, error = %err, "collection unreadable; using fallback");
                T::fallback()
            }
        }
    }

    fn save<T: Record>(&self, snapshot: &Snapshot<T>) -> anyhow::Result<()> {
        let mut entries = Vec::with_capacity(snapshot.records.len() + snapshot.undecodable.len());
        for record in &snapshot.records {
            entries.push(serde_json::to_value(record)?);
        }
        entries.extend(snapshot.undecodable.iter().cloned());
        self.backend.write(T::COLLECTION, &serde_json::to_string(&entries)?)
    }

    fn write_collection<T: Record>(&self, items: &[T]) -> anyhow::Result<()> {
        let raw = serde_json::to_string(items)?;
        self.backend.write(T::COLLECTION, &raw)
    }
}

/// Typed view over one collection of a [`LocalDatabase`].
pub struct Collection<'a, T, B> {
    db: &'a LocalDatabase<B>,
    _record: PhantomData<T>,
}

impl<'a, T, B> Collection<'a, T, B> {
    fn new(db: &'a LocalDatabase<B>) -> Self {
        Self {
            db,
            _record: PhantomData,
        }
    }
}

impl<T: Record, B: StorageBackend> Repository<T> for Collection<'_, T, B> {
    fn list(&self) -> Vec<T> {
        self.db.read_collection()
    }

    fn get(&self, id: &str) -> Option<T> {
        self.list().into_iter().find(|record| record.id() == id)
    }

    fn upsert(&self, record: T) -> anyhow::Result<Vec<T>> {
        let mut snapshot = self.db.snapshot::<T>()?;
        let items = &mut snapshot.records;
        match items.iter().position(|existing| existing.id() == record.id()) {
            Some(index) => items[index] = record,
            None if T::PREPEND_NEW => items.insert(0, record),
            None => items.push(record),
        }
        self.db.save(&snapshot)?;
        Ok(snapshot.records)
    }

    fn delete(&self, id: &str) -> anyhow::Result<Vec<T>> {
        let mut snapshot = self.db.snapshot::<T>()?;
        snapshot.records.retain(|record| record.id() != id);
        self.db.save(&snapshot)?;
        Ok(snapshot.records)
    }
}
