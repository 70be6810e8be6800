//! Static geographic data: territory polygons, annotated places and fault traces.
//!
//! Boundaries are simplified from Kroeber (1925), Steward (1933, 1938),
//! Zigmond (1981) and Native Land Digital. They are approximate and meant for
//! illustration only.

use geo::{Area, Contains, LineString, Point, Polygon, Winding};
use serde_json::{json, Value};

// =============================================================================
// TERRITORIES
// =============================================================================

/// A named ethnographic territory stored as a closed (lon, lat) ring.
#[derive(Clone, Copy, Debug)]
pub struct Territory {
    pub key: &'static str,
    /// Legend label
    pub name: &'static str,
    /// Fill color (sRGB)
    pub color: [u8; 3],
    pub vertices: &'static [(f64, f64)],
}

impl Territory {
    /// First and last vertex coincide.
    pub fn is_closed(&self) -> bool {
        match (self.vertices.first(), self.vertices.last()) {
            (Some(first), Some(last)) => first == last,
            _ => false,
        }
    }

    pub fn ring(&self) -> LineString<f64> {
        LineString::from(self.vertices.to_vec())
    }

    pub fn polygon(&self) -> Polygon<f64> {
        Polygon::new(self.ring(), vec![])
    }

    pub fn is_clockwise(&self) -> bool {
        self.ring().is_cw()
    }

    /// Planar area in square degrees.
    pub fn area_deg2(&self) -> f64 {
        self.polygon().unsigned_area()
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.polygon().contains(&Point::new(lon, lat))
    }
}

/// Kawaiisu: Tehachapi Mountains and southern Sierra Nevada foothills.
const KAWAIISU: &[(f64, f64)] = &[
    (-118.6, 35.8),
    (-118.6, 36.2),
    (-118.3, 36.4),
    (-117.8, 36.3),
    (-117.5, 36.0),
    (-117.2, 35.8),
    (-118.6, 35.8),
];

/// Tubatulabal: upper Kern River valley.
const TUBATULABAL: &[(f64, f64)] = &[
    (-118.6, 36.2),
    (-118.6, 36.7),
    (-118.3, 36.8),
    (-118.0, 36.6),
    (-118.3, 36.4),
    (-118.6, 36.2),
];

/// Newe Sogobia: Death Valley, Saline Valley and the eastern ranges
/// (Timbisha / Panamint Shoshone).
const WESTERN_SHOSHONE: &[(f64, f64)] = &[
    (-117.8, 36.3),
    (-118.0, 36.6),
    (-117.8, 37.0),
    (-117.5, 37.3),
    (-117.2, 37.5),
    (-116.8, 37.5),
    (-116.8, 36.2),
    (-117.2, 35.8),
    (-117.5, 36.0),
    (-117.8, 36.3),
];

/// Nüümü Witü: Owens Valley and the eastern Sierra.
const NUUMU_WITU: &[(f64, f64)] = &[
    (-118.3, 36.8),
    (-118.6, 36.7),
    (-118.6, 37.4),
    (-118.4, 37.6),
    (-118.0, 37.5),
    (-117.8, 37.0),
    (-118.0, 36.6),
    (-118.3, 36.8),
];

/// Nüümü: northern Owens Valley extending north.
const NUUMU: &[(f64, f64)] = &[
    (-118.6, 37.4),
    (-118.6, 37.8),
    (-117.8, 37.8),
    (-117.2, 37.5),
    (-117.5, 37.3),
    (-117.8, 37.0),
    (-118.0, 37.5),
    (-118.4, 37.6),
    (-118.6, 37.4),
];

/// The five territories in draw order.
pub const TERRITORIES: [Territory; 5] = [
    Territory {
        key: "kawaiisu",
        name: "Kawaiisu",
        color: [0xE6, 0x55, 0x0D],
        vertices: KAWAIISU,
    },
    Territory {
        key: "tubatulabal",
        name: "Tubatulabal",
        color: [0x31, 0xA3, 0x54],
        vertices: TUBATULABAL,
    },
    Territory {
        key: "western_shoshone",
        name: "Newe Sogobia (Western Shoshone)",
        color: [0x75, 0x6B, 0xB1],
        vertices: WESTERN_SHOSHONE,
    },
    Territory {
        key: "nuumu_witu",
        name: "Nüümü Witü (Eastern Mono)",
        color: [0x31, 0x82, 0xBD],
        vertices: NUUMU_WITU,
    },
    Territory {
        key: "nuumu",
        name: "Nüümü (Northern Paiute)",
        color: [0xE7, 0x29, 0x8A],
        vertices: NUUMU,
    },
];

pub fn territories() -> &'static [Territory] {
    &TERRITORIES
}

/// First territory (in draw order) whose interior contains the point.
pub fn territory_at(lon: f64, lat: f64) -> Option<&'static Territory> {
    TERRITORIES.iter().find(|t| t.contains(lon, lat))
}

/// The territory table as a GeoJSON FeatureCollection.
pub fn territories_geojson() -> Value {
    let features: Vec<Value> = TERRITORIES
        .iter()
        .map(|t| {
            let ring: Vec<[f64; 2]> = t.vertices.iter().map(|&(lon, lat)| [lon, lat]).collect();
            json!({
                "type": "Feature",
                "properties": {
                    "key": t.key,
                    "name": t.name,
                    "color": format!("#{:02X}{:02X}{:02X}", t.color[0], t.color[1], t.color[2]),
                },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [ring],
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

// =============================================================================
// PLACES
// =============================================================================

/// A labelled point of interest.
#[derive(Clone, Copy, Debug)]
pub struct Place {
    pub name: &'static str,
    pub lon: f64,
    pub lat: f64,
    /// Drawn bold and larger
    pub emphasis: bool,
}

const fn place(name: &'static str, lon: f64, lat: f64) -> Place {
    Place { name, lon, lat, emphasis: false }
}

/// Places annotated on the territorial map. Mono Lake lies off the map and is
/// skipped when drawing.
pub const TERRITORIAL_PLACES: [Place; 6] = [
    Place { name: "Saline Valley", lon: -117.85, lat: 36.75, emphasis: true },
    place("Death Valley", -117.0, 36.5),
    place("Owens Lake", -117.95, 36.45),
    place("Mono Lake", -119.0, 38.0),
    place("Panamint Valley", -117.4, 36.1),
    place("Eureka Valley", -117.65, 37.1),
];

/// Places annotated on the geologic map.
pub const GEOLOGIC_PLACES: [Place; 5] = [
    Place { name: "Saline Valley", lon: -117.85, lat: 36.75, emphasis: true },
    place("Death Valley", -117.0, 36.5),
    place("Owens Lake\n(dry)", -117.95, 36.42),
    place("Panamint Valley", -117.38, 36.1),
    place("Eureka Valley", -117.65, 37.1),
];

// =============================================================================
// FAULTS
// =============================================================================

/// Simplified trace of a Basin and Range normal fault.
#[derive(Clone, Copy, Debug)]
pub struct Fault {
    pub name: &'static str,
    pub trace: &'static [(f64, f64)],
}

pub const FAULTS: [Fault; 4] = [
    Fault {
        name: "Owens Valley Fault Zone",
        trace: &[(-118.35, 35.8), (-118.25, 36.5), (-118.2, 37.0), (-118.15, 37.8)],
    },
    Fault {
        name: "Inyo Mountains Fault",
        trace: &[(-117.7, 36.0), (-117.65, 36.8), (-117.6, 37.5)],
    },
    Fault {
        name: "Death Valley Fault Zone",
        trace: &[(-117.0, 35.8), (-116.95, 36.3), (-116.9, 36.8), (-116.85, 37.3)],
    },
    Fault {
        name: "Panamint Valley Fault",
        trace: &[(-117.35, 35.8), (-117.3, 36.3), (-117.25, 36.7)],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Extent;

    #[test]
    fn test_every_territory_is_closed() {
        for t in territories() {
            assert!(t.is_closed(), "{} ring is open", t.key);
            assert!(t.vertices.len() >= 4, "{} has too few vertices", t.key);
        }
    }

    #[test]
    fn test_consistent_winding() {
        let first = TERRITORIES[0].is_clockwise();
        for t in territories() {
            assert_eq!(t.is_clockwise(), first, "{} winds the other way", t.key);
        }
    }

    #[test]
    fn test_territories_inside_study_area() {
        let extent = Extent::SALINE_VALLEY;
        for t in territories() {
            for &(lon, lat) in t.vertices {
                assert!(extent.contains(lon, lat), "{} vertex ({lon}, {lat}) off map", t.key);
            }
            assert!(t.area_deg2() > 0.0);
        }
    }

    #[test]
    fn test_territory_lookup() {
        assert_eq!(territory_at(-117.85, 36.75).map(|t| t.key), Some("western_shoshone"));
        assert_eq!(territory_at(-118.4, 36.0).map(|t| t.key), Some("kawaiisu"));
        assert_eq!(territory_at(-118.5, 37.7).map(|t| t.key), Some("nuumu"));
        assert!(territory_at(-119.0, 38.0).is_none());
    }

    #[test]
    fn test_geojson_export() {
        let doc = territories_geojson();
        assert_eq!(doc["type"], "FeatureCollection");
        let features = doc["features"].as_array().unwrap();
        assert_eq!(features.len(), 5);
        assert_eq!(features[0]["properties"]["color"], "#E6550D");
        let ring = features[2]["geometry"]["coordinates"][0].as_array().unwrap();
        assert_eq!(ring.len(), WESTERN_SHOSHONE.len());
        assert_eq!(ring.first(), ring.last());
    }
}
