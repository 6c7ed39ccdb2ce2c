//! Sticker Integration Tests
//!
//! End-to-end tests through the `Starling` facade: purchases and level-ups,
//! queries, contention, WAL recovery and configuration.

mod common;

mod concurrency;
mod config;
mod durability;
mod purchase;
mod queries;
mod registry;
