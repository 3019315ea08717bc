//! Infrastructure layer: row mapping, outbox, atomic commit, queries, config.

pub mod clock;
pub mod command_dispatcher;
pub mod committer;
pub mod config;
pub mod memory;
pub mod mutation;
pub mod outbox;
pub mod postgres;
pub mod product_service;
pub mod queries;
pub mod read_model;
pub mod store;
