// src/db/models/mod.rs

//! Data models for catalog database entities

mod package;

pub use package::CatalogEntry;
