mod backend;
mod database;
mod seed;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use database::{
    Collection, LocalDatabase, Record, Repository, SeedReport, LEADS_KEY, PROJECTS_KEY,
    SESSION_KEY, USERS_KEY,
};
pub use seed::{seed_projects, seed_users};
