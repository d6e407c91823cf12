use foundation::LngLat;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(LngLat),
    MultiPoint(Vec<LngLat>),
    LineString(Vec<LngLat>),
    MultiLineString(Vec<Vec<LngLat>>),
    Polygon(Vec<Vec<LngLat>>),
    MultiPolygon(Vec<Vec<Vec<LngLat>>>),
}

impl Geometry {
    /// First coordinate of the geometry, used to anchor popups.
    pub fn anchor(&self) -> Option<LngLat> {
        match self {
            Geometry::Point(p) => Some(*p),
            Geometry::MultiPoint(pts) | Geometry::LineString(pts) => pts.first().copied(),
            Geometry::MultiLineString(lines) | Geometry::Polygon(lines) => {
                lines.first().and_then(|l| l.first()).copied()
            }
            Geometry::MultiPolygon(polys) => polys
                .first()
                .and_then(|p| p.first())
                .and_then(|r| r.first())
                .copied(),
        }
    }
}

/// Feature ids as MapLibre sees them: feature state needs one to attach to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeatureId {
    Number(i64),
    String(String),
}

impl FeatureId {
    pub fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Number(n) => n.as_i64().map(FeatureId::Number),
            Value::String(s) => Some(FeatureId::String(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            FeatureId::Number(n) => Value::from(*n),
            FeatureId::String(s) => Value::String(s.clone()),
        }
    }
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureId::Number(n) => write!(f, "{n}"),
            FeatureId::String(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<FeatureId>,
    pub properties: Map<String, Value>,
    /// `None` for features with a `null` geometry.
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

#[derive(Debug)]
pub enum GeoJsonError {
    Parse(String),
    NotAFeatureCollection,
    InvalidFeature { index: usize, reason: String },
}

impl std::fmt::Display for GeoJsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoJsonError::Parse(msg) => write!(f, "JSON parse error: {msg}"),
            GeoJsonError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
            GeoJsonError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for GeoJsonError {}

impl FeatureCollection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn from_geojson_str(payload: &str) -> Result<Self, GeoJsonError> {
        let value: Value =
            serde_json::from_str(payload).map_err(|e| GeoJsonError::Parse(e.to_string()))?;
        Self::from_geojson_value(&value)
    }

    pub fn from_geojson_value(value: &Value) -> Result<Self, GeoJsonError> {
        let obj = value
            .as_object()
            .ok_or(GeoJsonError::NotAFeatureCollection)?;
        let ty = obj
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or(GeoJsonError::NotAFeatureCollection)?;
        if ty != "FeatureCollection" {
            return Err(GeoJsonError::NotAFeatureCollection);
        }

        let features_val = obj
            .get("features")
            .and_then(|v| v.as_array())
            .ok_or(GeoJsonError::NotAFeatureCollection)?;

        let mut features = Vec::with_capacity(features_val.len());
        for (index, feat_val) in features_val.iter().enumerate() {
            let invalid = |reason: String| GeoJsonError::InvalidFeature { index, reason };

            let feat_obj = feat_val
                .as_object()
                .ok_or_else(|| invalid("feature must be an object".to_string()))?;

            let feat_type = feat_obj
                .get("type")
                .and_then(|v| v.as_str())
                .ok_or_else(|| invalid("feature missing type".to_string()))?;
            if feat_type != "Feature" {
                return Err(invalid(format!("unexpected feature type: {feat_type}")));
            }

            let id = feat_obj.get("id").and_then(FeatureId::from_value);

            let properties = feat_obj
                .get("properties")
                .and_then(|v| v.as_object())
                .cloned()
                .unwrap_or_default();

            let geometry = match feat_obj.get("geometry") {
                None | Some(Value::Null) => None,
                Some(g) => Some(parse_geometry(g).map_err(invalid)?),
            };

            features.push(Feature {
                id,
                properties,
                geometry,
            });
        }

        Ok(Self { features })
    }

    pub fn to_geojson_value(&self) -> Value {
        let features = self
            .features
            .iter()
            .map(|feat| {
                let mut obj = Map::new();
                obj.insert("type".to_string(), Value::from("Feature"));
                if let Some(id) = &feat.id {
                    obj.insert("id".to_string(), id.to_value());
                }
                obj.insert(
                    "properties".to_string(),
                    Value::Object(feat.properties.clone()),
                );
                obj.insert(
                    "geometry".to_string(),
                    feat.geometry
                        .as_ref()
                        .map_or(Value::Null, geometry_to_geojson_value),
                );
                Value::Object(obj)
            })
            .collect();

        let mut root = Map::new();
        root.insert("type".to_string(), Value::from("FeatureCollection"));
        root.insert("features".to_string(), Value::Array(features));
        Value::Object(root)
    }

    pub fn to_geojson_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_geojson_value())
    }
}

fn point_value(p: &LngLat) -> Value {
    Value::from(vec![p.lng, p.lat])
}

fn points_value(pts: &[LngLat]) -> Value {
    Value::Array(pts.iter().map(point_value).collect())
}

fn lines_value(lines: &[Vec<LngLat>]) -> Value {
    Value::Array(lines.iter().map(|l| points_value(l)).collect())
}

fn geometry_to_geojson_value(geom: &Geometry) -> Value {
    let (ty, coords) = match geom {
        Geometry::Point(p) => ("Point", point_value(p)),
        Geometry::MultiPoint(pts) => ("MultiPoint", points_value(pts)),
        Geometry::LineString(pts) => ("LineString", points_value(pts)),
        Geometry::MultiLineString(lines) => ("MultiLineString", lines_value(lines)),
        Geometry::Polygon(rings) => ("Polygon", lines_value(rings)),
        Geometry::MultiPolygon(polys) => (
            "MultiPolygon",
            Value::Array(polys.iter().map(|p| lines_value(p)).collect()),
        ),
    };
    let mut obj = Map::new();
    obj.insert("type".to_string(), Value::from(ty));
    obj.insert("coordinates".to_string(), coords);
    Value::Object(obj)
}

fn parse_geometry(geometry: &Value) -> Result<Geometry, String> {
    let obj = geometry
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("geometry missing type".to_string())?;
    let coords = obj
        .get("coordinates")
        .ok_or("geometry missing coordinates".to_string())?;

    match ty {
        "Point" => Ok(Geometry::Point(parse_point(coords)?)),
        "MultiPoint" => Ok(Geometry::MultiPoint(parse_points(coords)?)),
        "LineString" => Ok(Geometry::LineString(parse_points(coords)?)),
        "MultiLineString" => Ok(Geometry::MultiLineString(parse_lines(coords)?)),
        "Polygon" => Ok(Geometry::Polygon(parse_lines(coords)?)),
        "MultiPolygon" => {
            let polys = coords
                .as_array()
                .ok_or("MultiPolygon coordinates must be an array of polygons".to_string())?;
            let mut out = Vec::with_capacity(polys.len());
            for poly in polys {
                out.push(parse_lines(poly)?);
            }
            Ok(Geometry::MultiPolygon(out))
        }
        other => Err(format!("unsupported geometry type: {other}")),
    }
}

fn parse_point(coords: &Value) -> Result<LngLat, String> {
    let arr = coords
        .as_array()
        .ok_or("Point coordinates must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("Point coordinates must have [lon, lat]".to_string());
    }
    let lon = arr[0]
        .as_f64()
        .ok_or("Point lon must be a number".to_string())?;
    let lat = arr[1]
        .as_f64()
        .ok_or("Point lat must be a number".to_string())?;
    Ok(LngLat::new(lon, lat))
}

fn parse_points(coords: &Value) -> Result<Vec<LngLat>, String> {
    let arr = coords
        .as_array()
        .ok_or("coordinates must be an array".to_string())?;
    let mut out = Vec::with_capacity(arr.len());
    for item in arr {
        out.push(parse_point(item)?);
    }
    Ok(out)
}

fn parse_lines(coords: &Value) -> Result<Vec<Vec<LngLat>>, String> {
    let arr = coords
        .as_array()
        .ok_or("line/ring coordinates must be an array".to_string())?;
    let mut out = Vec::with_capacity(arr.len());
    for line in arr {
        out.push(parse_points(line)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{FeatureCollection, FeatureId, GeoJsonError, Geometry};
    use foundation::LngLat;

    const OBSTACLES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "id": 7,
             "properties": {"Type": "Obstacles", "Evaluation": "Severe", "Value": "Bollard"},
             "geometry": {"type": "Point", "coordinates": [2.17, 41.39]}},
            {"type": "Feature", "id": "w-1",
             "properties": {"Type": "Width"},
             "geometry": null},
            {"type": "Feature",
             "geometry": {"type": "LineString", "coordinates": [[2.1, 41.3], [2.2, 41.4]]}}
        ]
    }"#;

    #[test]
    fn parses_ids_properties_and_geometries() {
        let fc = FeatureCollection::from_geojson_str(OBSTACLES).expect("parse");
        assert_eq!(fc.len(), 3);
        assert_eq!(fc.features[0].id, Some(FeatureId::Number(7)));
        assert_eq!(fc.features[1].id, Some(FeatureId::String("w-1".to_string())));
        assert_eq!(fc.features[2].id, None);
        assert_eq!(fc.features[0].properties["Evaluation"], "Severe");
        assert_eq!(fc.features[1].geometry, None);
        assert!(fc.features[2].properties.is_empty());
        assert_eq!(
            fc.features[0].geometry.as_ref().and_then(Geometry::anchor),
            Some(LngLat::new(2.17, 41.39))
        );
    }

    #[test]
    fn reserializes_to_equivalent_collection() {
        let fc = FeatureCollection::from_geojson_str(OBSTACLES).expect("parse");
        let again = FeatureCollection::from_geojson_value(&fc.to_geojson_value()).expect("reparse");
        assert_eq!(fc, again);
    }

    #[test]
    fn rejects_non_collections_and_bad_features() {
        assert!(matches!(
            FeatureCollection::from_geojson_str(r#"{"type": "Feature"}"#),
            Err(GeoJsonError::NotAFeatureCollection)
        ));
        assert!(matches!(
            FeatureCollection::from_geojson_str("not json"),
            Err(GeoJsonError::Parse(_))
        ));
        let bad = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1]}}]}"#;
        assert!(matches!(
            FeatureCollection::from_geojson_str(bad),
            Err(GeoJsonError::InvalidFeature { index: 0, .. })
        ));
    }

    #[test]
    fn empty_collection_serializes() {
        let text = FeatureCollection::empty().to_geojson_string().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"type": "FeatureCollection", "features": []})
        );
    }
}
