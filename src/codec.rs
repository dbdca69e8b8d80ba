//! Wire format for the three encoded list columns on `games`.
//!
//! Associations are JSON arrays of `[id, weight]` pairs, materials a JSON
//! array of UPPERCASE names. An empty list always serializes to `[]`; a
//! NULL or missing value decodes as the empty list. This is the auditable
//! on-disk contract for the table and must round-trip exactly.

use crate::error::{StoreError, StoreResult};
use crate::model::Material;

pub(crate) fn encode_pairs(pairs: &[(i64, i64)], column: &'static str) -> StoreResult<String> {
    serde_json::to_string(pairs).map_err(|e| StoreError::corrupt(column, e))
}

pub(crate) fn decode_pairs(raw: Option<&str>, column: &'static str) -> StoreResult<Vec<(i64, i64)>> {
    match raw {
        None => Ok(Vec::new()),
        Some(text) if text.trim().is_empty() => Ok(Vec::new()),
        Some(text) => serde_json::from_str(text).map_err(|e| StoreError::corrupt(column, e)),
    }
}

pub(crate) fn encode_materials(materials: &[Material]) -> StoreResult<String> {
    serde_json::to_string(materials).map_err(|e| StoreError::corrupt("materials", e))
}

pub(crate) fn decode_materials(raw: Option<&str>) -> StoreResult<Vec<Material>> {
    match raw {
        None => Ok(Vec::new()),
        Some(text) if text.trim().is_empty() => Ok(Vec::new()),
        Some(text) => serde_json::from_str(text).map_err(|e| StoreError::corrupt("materials", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageFailure;

    #[test]
    fn pairs_round_trip() {
        let pairs = vec![(3, 5), (7, 0)];
        let encoded = encode_pairs(&pairs, "cognitive_categories").expect("encode");
        assert_eq!(encoded, "[[3,5],[7,0]]");
        let decoded = decode_pairs(Some(&encoded), "cognitive_categories").expect("decode");
        assert_eq!(decoded, pairs);
    }

    #[test]
    fn empty_list_is_brackets_not_null() {
        assert_eq!(
            encode_pairs(&[], "cognitive_functions").expect("encode"),
            "[]"
        );
        assert_eq!(encode_materials(&[]).expect("encode"), "[]");
    }

    #[test]
    fn null_and_blank_decode_as_empty() {
        assert!(decode_pairs(None, "cognitive_categories")
            .expect("decode")
            .is_empty());
        assert!(decode_pairs(Some("  "), "cognitive_categories")
            .expect("decode")
            .is_empty());
        assert!(decode_materials(None).expect("decode").is_empty());
    }

    #[test]
    fn materials_use_uppercase_names() {
        let encoded =
            encode_materials(&[Material::Visual, Material::Auditory]).expect("encode");
        assert_eq!(encoded, r#"["VISUAL","AUDITORY"]"#);
        let decoded = decode_materials(Some(&encoded)).expect("decode");
        assert_eq!(decoded, vec![Material::Visual, Material::Auditory]);
    }

    #[test]
    fn garbage_payload_surfaces_column() {
        let err = decode_pairs(Some("not json"), "cognitive_categories").unwrap_err();
        match err {
            StoreError::Storage(StorageFailure::Encoding { column, .. }) => {
                assert_eq!(column, "cognitive_categories")
            }
            other => panic!("expected Encoding failure, got {other:?}"),
        }
    }

    #[test]
    fn unknown_material_name_is_corruption() {
        assert!(decode_materials(Some(r#"["OLFACTORY"]"#)).is_err());
    }
}
