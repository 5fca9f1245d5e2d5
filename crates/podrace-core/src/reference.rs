//! Static reference data (tracks and racers) loaded once at startup.

use serde::de::DeserializeOwned;
use std::path::Path;

use crate::error::Result;
use crate::types::{Racer, Track};

fn load_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let data = std::fs::read_to_string(path)?;
    let list: Vec<T> = serde_json::from_str(&data)?;
    Ok(list)
}

pub fn load_tracks(path: &Path) -> Result<Vec<Track>> {
    load_list(path)
}

pub fn load_racers(path: &Path) -> Result<Vec<Racer>> {
    load_list(path)
}

/// A reference list that failed to load renders as empty instead of
/// aborting the page.
pub fn or_empty<T, E>(what: &str, result: std::result::Result<Vec<T>, E>) -> Vec<T>
where
    E: std::fmt::Display,
{
    match result {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load {what}; showing an empty list");
            Vec::new()
        }
    }
}
