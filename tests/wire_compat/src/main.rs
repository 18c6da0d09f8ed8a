fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use rapidcomm_protocol::UploadResponse;
    use rapidcomm_protocol::types::{ProgressUpdate, UploadStats};
    use rapidcomm_transfer::{DigestHasher, digest, verify};
    use serde::Deserialize;

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Normalizes JSON numbers so that `50` and `50.0` compare equal.
    ///
    /// Browser clients emit integral floats without a fraction; Rust emits
    /// `f64` with one.
    fn normalize_value(v: &serde_json::Value) -> serde_json::Value {
        match v {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => serde_json::json!(f),
                None => v.clone(),
            },
            serde_json::Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), normalize_value(v)))
                    .collect(),
            ),
            serde_json::Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(normalize_value).collect())
            }
            _ => v.clone(),
        }
    }

    /// Deserializes a fixture, re-serializes it, and compares the JSON.
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            normalize_value(&fixture),
            normalize_value(&reserialized),
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  rust:    {reserialized}"
        );
        parsed
    }

    #[derive(Deserialize)]
    struct DigestVector {
        name: String,
        hex: String,
        length: usize,
        digest: String,
    }

    fn digest_vectors() -> Vec<(DigestVector, Vec<u8>)> {
        #[derive(Deserialize)]
        struct File {
            vectors: Vec<DigestVector>,
        }
        let file: File = serde_json::from_value(load_fixture("digest_vectors.json")).unwrap();
        file.vectors
            .into_iter()
            .map(|v| {
                let data = hex::decode(&v.hex).unwrap();
                assert_eq!(data.len(), v.length, "bad fixture {}", v.name);
                (v, data)
            })
            .collect()
    }

    // --- Digest ---

    #[test]
    fn digest_matches_vectors() {
        for (v, data) in digest_vectors() {
            let d = digest(&data);
            assert_eq!(d.len(), 64);
            assert_eq!(d, v.digest, "digest mismatch for {}", v.name);
        }
    }

    #[test]
    fn incremental_digest_matches_vectors() {
        for (v, data) in digest_vectors() {
            let (head, tail) = data.split_at(data.len() / 2);
            let mut hasher = DigestHasher::new();
            hasher.update(head);
            hasher.update(tail);
            assert_eq!(hasher.finalize(), v.digest, "incremental mismatch for {}", v.name);
        }
    }

    #[test]
    fn vectors_verify_against_themselves() {
        for (v, data) in digest_vectors() {
            let result = verify(&data, v.length as u64, &v.digest);
            assert!(result.verified, "{} did not verify: {:?}", v.name, result.mismatch);
        }
    }

    #[test]
    fn vector_digests_are_distinct() {
        let vectors = digest_vectors();
        for (i, (a, _)) in vectors.iter().enumerate() {
            for (b, _) in &vectors[i + 1..] {
                assert_ne!(a.digest, b.digest, "{} and {} collide", a.name, b.name);
            }
        }
    }

    // --- Backend responses ---

    #[test]
    fn fixture_upload_response_success() {
        let resp: UploadResponse = roundtrip_test("upload_response_success.json");
        assert!(resp.is_success());
        assert_eq!(resp.filename.as_deref(), Some("report.pdf"));

        // The fixture reports the digest of "hello".
        let hash = resp.hash.unwrap();
        assert!(verify(b"hello", resp.size.unwrap(), &hash).verified);
    }

    #[test]
    fn fixture_upload_response_error() {
        let resp: UploadResponse = roundtrip_test("upload_response_error.json");
        assert!(!resp.is_success());
        assert_eq!(resp, UploadResponse::error("No file provided"));
    }

    // --- Client-side payloads ---

    #[test]
    fn fixture_progress_update() {
        let update: ProgressUpdate = roundtrip_test("progress_update.json");
        assert_eq!(update.file_index, 1);
        assert_eq!(update.remaining_bytes(), 512);
    }

    #[test]
    fn fixture_upload_stats() {
        let stats: UploadStats = roundtrip_test("upload_stats.json");
        assert!(stats.is_settled());
        assert_eq!(stats.settled_files(), 3);
    }
}
