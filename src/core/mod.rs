//! Configuration, data model and argument guards shared by every component.

pub mod config;
pub mod guard;
pub mod models;
