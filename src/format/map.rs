//! Range map links

use super::taxon::{format_taxon_names, NameOptions};
use super::{Embed, MAX_EMBED_DESCRIPTION_LEN};
use crate::models::{Bounds, Taxon, WWW_BASE_URL};

/// Zoom level and center of a map view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapCoords {
    pub zoom: i32,
    pub lat: f64,
    pub lon: f64,
}

/// Longitude in `0..=360`.
pub fn normalize_longitude(lon: f64) -> f64 {
    if (0.0..=360.0).contains(&lon) {
        lon
    } else {
        lon.rem_euclid(360.0)
    }
}

/// Zoom level that fits the box, from 2 (whole world) to 10.
pub fn zoom_level(swlat: f64, swlng: f64, nelat: f64, nelng: f64) -> i32 {
    let mut angle = swlng.max(nelng) - swlng.min(nelng);
    let lat_angle = swlat.max(nelat) - swlat.min(nelat);
    let mut delta = 0;
    if lat_angle > angle {
        angle = lat_angle;
        delta = 3;
    }
    if angle < 0.0 {
        angle += 360.0;
    }
    if angle == 0.0 {
        return 10;
    }
    let zoom = (394.0 / angle).log2().trunc() as i32 + 2 - delta;
    zoom.clamp(2, 10)
}

pub fn map_coords(bounds: Option<&Bounds>) -> MapCoords {
    let Some(bounds) = bounds else {
        return MapCoords {
            zoom: 2,
            lat: 0.0,
            lon: 0.0,
        };
    };
    let swlng = normalize_longitude(bounds.swlng);
    let nelng = normalize_longitude(bounds.nelng);
    MapCoords {
        zoom: zoom_level(bounds.swlat, swlng, bounds.nelat, nelng),
        lat: (bounds.swlat + bounds.nelat) / 2.0,
        lon: (swlng + nelng) / 2.0,
    }
}

pub fn taxa_map_url(taxa: &[Taxon], bounds: Option<&Bounds>) -> String {
    let ids: Vec<String> = taxa.iter().map(|t| t.id.to_string()).collect();
    let coords = map_coords(bounds);
    format!(
        "{WWW_BASE_URL}/taxa/map?taxa={}#{}/{}/{}",
        ids.join(","),
        coords.zoom,
        coords.lat,
        coords.lon
    )
}

pub fn map_embed(taxa: &[Taxon], bounds: Option<&Bounds>, missing: &[String]) -> Embed {
    let names = format_taxon_names(taxa, NameOptions::with_term(), MAX_EMBED_DESCRIPTION_LEN / 2);
    let embed = Embed::new(format!("Range map for {names}")).url(taxa_map_url(taxa, bounds));
    if missing.is_empty() {
        embed
    } else {
        embed.footer(format!(
            "Some taxa could not be found and were ignored: {}",
            missing.join(",")
        ))
    }
}
