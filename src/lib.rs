//! Staged stock research with a persistent, subject-scoped result cache.
//!
//! A [`Wizard`](application::wizard::Wizard) walks a subject through the
//! research stages. Every stage result is written through to a
//! [`CacheStore`](application::cache_store::CacheStore) so revisiting a
//! subject restores it without calling out again.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod presentation;
pub mod state;
