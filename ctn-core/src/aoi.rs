use geo::{Contains, Coord, LineString, MultiPolygon, Point, Polygon};
use serde_json::Value;
use std::path::Path;

/// The geographic area of interest, loaded from a GeoJSON boundary file.
/// Used as a point-in-region predicate by the spatial filter.
#[derive(Debug, Clone)]
pub struct AreaOfInterest {
    boundary: MultiPolygon<f64>,
}

impl AreaOfInterest {
    pub fn new(boundary: MultiPolygon<f64>) -> Self {
        AreaOfInterest { boundary }
    }

    /// True when the point lies within the boundary. Non-finite
    /// coordinates never match.
    pub fn contains(&self, lat: f64, long: f64) -> bool {
        if !lat.is_finite() || !long.is_finite() {
            return false;
        }
        self.boundary.contains(&Point::new(long, lat))
    }

    pub fn from_geojson_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        AreaOfInterest::from_geojson_str(&text)
    }

    /// Parse a GeoJSON document carrying the boundary. Accepts a bare
    /// Polygon/MultiPolygon geometry, a Feature, or a FeatureCollection
    /// (all polygonal features contribute).
    pub fn from_geojson_str(text: &str) -> anyhow::Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        let mut polygons: Vec<Polygon<f64>> = Vec::new();
        collect_polygons(&value, &mut polygons)?;
        if polygons.is_empty() {
            anyhow::bail!("boundary file contains no polygon geometry");
        }
        Ok(AreaOfInterest::new(MultiPolygon(polygons)))
    }
}

fn collect_polygons(value: &Value, out: &mut Vec<Polygon<f64>>) -> anyhow::Result<()> {
    match value.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => {
            let features = value
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| anyhow::anyhow!("FeatureCollection without features"))?;
            for feature in features {
                collect_polygons(feature, out)?;
            }
        }
        Some("Feature") => {
            if let Some(geometry) = value.get("geometry") {
                collect_polygons(geometry, out)?;
            }
        }
        Some("Polygon") => {
            let rings = value
                .get("coordinates")
                .ok_or_else(|| anyhow::anyhow!("Polygon without coordinates"))?;
            out.push(parse_polygon(rings)?);
        }
        Some("MultiPolygon") => {
            let shells = value
                .get("coordinates")
                .and_then(Value::as_array)
                .ok_or_else(|| anyhow::anyhow!("MultiPolygon without coordinates"))?;
            for rings in shells {
                out.push(parse_polygon(rings)?);
            }
        }
        // other geometry types carry no area and are ignored
        Some(_) => {}
        None => anyhow::bail!("GeoJSON value without a type"),
    }
    Ok(())
}

fn parse_polygon(rings: &Value) -> anyhow::Result<Polygon<f64>> {
    let rings = rings
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("polygon coordinates are not an array"))?;
    let mut line_strings = rings.iter().map(parse_ring);
    let exterior = line_strings
        .next()
        .ok_or_else(|| anyhow::anyhow!("polygon without an exterior ring"))??;
    let interiors = line_strings.collect::<anyhow::Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn parse_ring(ring: &Value) -> anyhow::Result<LineString<f64>> {
    let positions = ring
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("polygon ring is not an array"))?;
    let mut coords = Vec::with_capacity(positions.len());
    for position in positions {
        let pair = position
            .as_array()
            .filter(|p| p.len() >= 2)
            .ok_or_else(|| anyhow::anyhow!("ring position is not an [x, y] pair"))?;
        let x = pair[0]
            .as_f64()
            .ok_or_else(|| anyhow::anyhow!("non-numeric coordinate"))?;
        let y = pair[1]
            .as_f64()
            .ok_or_else(|| anyhow::anyhow!("non-numeric coordinate"))?;
        coords.push(Coord { x, y });
    }
    Ok(LineString::new(coords))
}
