//! Data model and browser-storage style persistence for the NexGen agency
//! back-office. Nothing in this crate talks to the network.

pub mod auth;
pub mod chat;
pub mod events;
pub mod models;
pub mod store;
