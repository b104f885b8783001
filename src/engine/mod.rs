//! # Engine Module
//!
//! Internal ECS engine implementation.
//!
//! This module contains all core ECS building blocks such as:
//! - Identifiers and signatures
//! - The component registry
//! - Component storage
//! - Archetypes and the transition graph
//! - Entity management
//! - Query dispatch
//! - Deferred commands and systems
//!
//! Public API exposure is controlled by `lib.rs`.

pub mod types;
pub mod error;
pub mod config;
pub mod component;
pub mod storage;
pub mod entity;
pub mod archetype;
pub mod query;
pub mod world;
pub mod commands;
pub mod systems;
