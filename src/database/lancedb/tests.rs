use super::*;

#[test]
fn chunk_record_uses_ordinal_as_id() {
    let record = ChunkRecord::new(12, "table", "Table Orders: stores orders", vec![0.1, 0.2]);

    assert_eq!(record.id, "12");
    assert_eq!(record.ordinal, 12);
    assert_eq!(record.kind, "table");
    assert_eq!(record.vector.len(), 2);
}

#[test]
fn search_hit_similarity() {
    let hit = SearchHit {
        chunk: StoredChunk {
            id: "0".to_string(),
            ordinal: 0,
            kind: "term".to_string(),
            text: "Term AOV: average order value".to_string(),
        },
        distance: 0.25,
    };

    assert!((hit.similarity() - 0.75).abs() < f32::EPSILON);
}

#[test]
fn stored_chunk_serialization() {
    let chunk = StoredChunk {
        id: "3".to_string(),
        ordinal: 3,
        kind: "file".to_string(),
        text: "-- File revenue.sql\nSELECT 1;".to_string(),
    };

    let json = serde_json::to_string(&chunk).expect("can serialize json");
    let deserialized: StoredChunk = serde_json::from_str(&json).expect("can parse json");

    assert_eq!(chunk, deserialized);
}
