//! GeoJSON vector input
//!
//! Reads a GeoJSON FeatureCollection into the crate's `FeatureCollection`
//! type. Geometries are converted into `geo-types`; attribute values keep
//! their JSON types (integers stay integers where representable).

use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Feature, FeatureCollection};
use geojson::GeoJson;
use std::path::Path;

/// Read a GeoJSON file containing a FeatureCollection
pub fn read_feature_collection<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    let gj: GeoJson = contents
        .parse()
        .map_err(|e: geojson::Error| Error::GeoJson(e.to_string()))?;

    let fc = match gj {
        GeoJson::FeatureCollection(fc) => fc,
        _ => {
            return Err(Error::GeoJson(
                "expected a FeatureCollection at the top level".to_string(),
            ))
        }
    };

    let mut out = FeatureCollection::new();

    for gj_feature in fc.features {
        let geometry = match gj_feature.geometry {
            Some(geom) => Some(
                geo_types::Geometry::<f64>::try_from(geom)
                    .map_err(|e| Error::GeoJson(e.to_string()))?,
            ),
            None => None,
        };

        let mut feature = Feature {
            geometry,
            properties: Default::default(),
            id: match gj_feature.id {
                Some(geojson::feature::Id::String(s)) => Some(s),
                Some(geojson::feature::Id::Number(n)) => Some(n.to_string()),
                None => None,
            },
        };

        if let Some(props) = gj_feature.properties {
            for (key, value) in props {
                feature.set_property(key, json_to_attribute(value));
            }
        }

        out.push(feature);
    }

    Ok(out)
}

fn json_to_attribute(value: serde_json::Value) -> AttributeValue {
    match value {
        serde_json::Value::Null => AttributeValue::Null,
        serde_json::Value::Bool(b) => AttributeValue::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                AttributeValue::Int(i)
            } else {
                AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => AttributeValue::String(s),
        // Arrays/objects are not meaningful as basin attributes
        other => AttributeValue::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]]]
                },
                "properties": {
                    "HYBAS_ID": 5070054870,
                    "PFAF_ID": 5672,
                    "NEXT_DOWN": 0,
                    "NEXT_SINK": 5070054870,
                    "MAIN_BAS": 5070054870
                }
            }
        ]
    }"#;

    #[test]
    fn test_read_feature_collection() {
        let mut tmp = tempfile::NamedTempFile::with_suffix(".geojson").unwrap();
        tmp.write_all(SAMPLE.as_bytes()).unwrap();

        let fc = read_feature_collection(tmp.path()).unwrap();
        assert_eq!(fc.len(), 1);

        let feature = &fc.features[0];
        assert_eq!(feature.int_property("HYBAS_ID"), Some(5070054870));
        assert_eq!(feature.int_property("PFAF_ID"), Some(5672));
        assert!(matches!(
            feature.geometry,
            Some(geo_types::Geometry::Polygon(_))
        ));
    }

    #[test]
    fn test_rejects_bare_geometry() {
        let mut tmp = tempfile::NamedTempFile::with_suffix(".geojson").unwrap();
        tmp.write_all(br#"{"type": "Point", "coordinates": [1.0, 2.0]}"#)
            .unwrap();

        assert!(read_feature_collection(tmp.path()).is_err());
    }
}
