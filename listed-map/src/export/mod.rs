//! Modules d'export

pub mod geojson;
pub mod reproject;
