//! `era5cfg` - configuration layer for ERA5 retrieval and postprocessing
//!
//! Loads the YAML file that drives an ERA5 download and postprocessing run,
//! validates it against a fixed schema and hands out an immutable
//! [`config::Configuration`].

pub mod cli;
pub mod config;
pub mod error;
pub mod observability;
