use std::fmt;
use std::io::Read;
use std::path::Path;

use rapidcomm_protocol::constants::DIGEST_HEX_LEN;

const SALT1: &[u8] = b"salt1";
const SALT2_PREFIX: &str = "salt2";

/// Folds one byte into a rolling accumulator: `h * 31 + b` modulo 2^32.
#[inline]
fn roll(h: u32, b: u8) -> u32 {
    (h << 5).wrapping_sub(h).wrapping_add(u32::from(b))
}

// ---------------------------------------------------------------------------
// DigestHasher
// ---------------------------------------------------------------------------

/// Incremental form of [`digest`].
///
/// The three rolling accumulators see identical data; passes 2 and 3 only
/// differ once the salts are appended in [`finalize`](Self::finalize).
/// The backend computes the same value, so none of this may change.
#[derive(Debug, Clone)]
pub struct DigestHasher {
    h1: u32,
    h2: u32,
    h3: u32,
    checksum: u32,
    len: u64,
}

impl Default for DigestHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl DigestHasher {
    pub fn new() -> Self {
        Self {
            h1: 0,
            h2: 0,
            h3: 0,
            checksum: u32::MAX,
            len: 0,
        }
    }

    /// Feeds more file bytes into the digest.
    pub fn update(&mut self, data: &[u8]) {
        for &b in data {
            self.h1 = roll(self.h1, b);
            self.h2 = roll(self.h2, b);
            self.h3 = roll(self.h3, b);
            self.checksum = (self.checksum ^ u32::from(b)).rotate_left(1);
        }
        self.len += data.len() as u64;
    }

    /// Number of bytes hashed so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends the salts and renders the 64-character hex digest.
    pub fn finalize(self) -> String {
        let h1 = self.h1;
        let h2 = SALT1.iter().fold(self.h2, |h, &b| roll(h, b));
        let salt2 = format!("{SALT2_PREFIX}{}", self.len);
        let h3 = salt2.bytes().fold(self.h3, roll);
        let checksum = !self.checksum;

        let mut out = format!("{h1:x}{h2:x}{h3:x}{checksum:x}");
        if out.len() < DIGEST_HEX_LEN {
            out.extend(std::iter::repeat_n('0', DIGEST_HEX_LEN - out.len()));
        } else {
            out.truncate(DIGEST_HEX_LEN);
        }
        out
    }
}

/// Computes the 64-hex-character integrity digest of `data`.
///
/// Not a cryptographic hash: it only has to match the backend bit for bit.
pub fn digest(data: &[u8]) -> String {
    let mut hasher = DigestHasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Computes the digest of an entire file, reading it in 8 KiB blocks.
pub fn calculate_file_digest(path: &Path) -> std::io::Result<String> {
    hash_file(path).map(DigestHasher::finalize)
}

fn hash_file(path: &Path) -> std::io::Result<DigestHasher> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = DigestHasher::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher)
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Why a post-upload integrity check did not pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityMismatch {
    /// The backend stored a different number of bytes.
    SizeMismatch { local: u64, remote: u64 },
    /// The backend reported something that is not a 64-char hex digest.
    MalformedDigest { remote: String },
    DigestMismatch { local: String, remote: String },
}

impl fmt::Display for IntegrityMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch { local, remote } => {
                write!(f, "size mismatch: {local} vs {remote}")
            }
            Self::MalformedDigest { remote } => write!(f, "malformed remote digest: {remote:?}"),
            Self::DigestMismatch { local, remote } => {
                write!(f, "hash mismatch: {local} vs {remote}")
            }
        }
    }
}

/// Outcome of comparing a local file against what the backend stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityResult {
    pub verified: bool,
    pub mismatch: Option<IntegrityMismatch>,
}

impl IntegrityResult {
    fn ok() -> Self {
        Self {
            verified: true,
            mismatch: None,
        }
    }

    fn failed(mismatch: IntegrityMismatch) -> Self {
        Self {
            verified: false,
            mismatch: Some(mismatch),
        }
    }
}

fn is_well_formed(remote_digest: &str) -> bool {
    remote_digest.len() == DIGEST_HEX_LEN && hex::decode(remote_digest).is_ok()
}

fn compare(local: String, remote_digest: &str) -> IntegrityResult {
    if !is_well_formed(remote_digest) {
        return IntegrityResult::failed(IntegrityMismatch::MalformedDigest {
            remote: remote_digest.to_string(),
        });
    }
    if local == remote_digest {
        IntegrityResult::ok()
    } else {
        IntegrityResult::failed(IntegrityMismatch::DigestMismatch {
            local,
            remote: remote_digest.to_string(),
        })
    }
}

/// Verifies in-memory bytes against the size and digest reported remotely.
///
/// A size mismatch fails immediately without hashing.
pub fn verify(local: &[u8], remote_size: u64, remote_digest: &str) -> IntegrityResult {
    let local_size = local.len() as u64;
    if local_size != remote_size {
        return IntegrityResult::failed(IntegrityMismatch::SizeMismatch {
            local: local_size,
            remote: remote_size,
        });
    }
    compare(digest(local), remote_digest)
}

/// Verifies a file on disk against the size and digest reported remotely.
pub fn verify_file(
    path: &Path,
    remote_size: u64,
    remote_digest: &str,
) -> std::io::Result<IntegrityResult> {
    let local_size = std::fs::metadata(path)?.len();
    if local_size != remote_size {
        return Ok(IntegrityResult::failed(IntegrityMismatch::SizeMismatch {
            local: local_size,
            remote: remote_size,
        }));
    }
    let hasher = hash_file(path)?;
    // The file may have changed between stat and read.
    if hasher.len() != remote_size {
        return Ok(IntegrityResult::failed(IntegrityMismatch::SizeMismatch {
            local: hasher.len(),
            remote: remote_size,
        }));
    }
    Ok(compare(hasher.finalize(), remote_digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_always_64_hex_chars() {
        for data in [&b""[..], b"a", b"hello", &[0xffu8; 4096][..]] {
            let d = digest(data);
            assert_eq!(d.len(), 64);
            assert!(d.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn digest_known_values() {
        assert_eq!(
            digest(b""),
            "06824a9bc9c70914000000000000000000000000000000000000000000000000"
        );
        assert_eq!(
            digest(b"hello"),
            "5e918d2a4e1e509f75abc6b95e00000000000000000000000000000000000000"
        );
    }

    #[test]
    fn digest_is_deterministic() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i * 7 % 251) as u8).collect();
        assert_eq!(digest(&data), digest(&data));
    }

    #[test]
    fn digest_differs_by_length() {
        assert_ne!(digest(b"abcabc"), digest(b"abcabcabc"));
        assert_ne!(digest(&[1u8; 10]), digest(&[1u8; 11]));
    }

    #[test]
    fn incremental_matches_one_shot() {
        let data: Vec<u8> = (0..=255u8).cycle().take(20_000).collect();
        let mut hasher = DigestHasher::new();
        for chunk in data.chunks(777) {
            hasher.update(chunk);
        }
        assert_eq!(hasher.len(), 20_000);
        assert_eq!(hasher.finalize(), digest(&data));
    }

    #[test]
    fn checksum_matches_xor_rotate_from_zero() {
        // All-ones start with a final complement equals a zero start.
        let data = b"RapidComm integrity";
        let mut c: u32 = 0;
        for &b in data {
            c = (c ^ u32::from(b)).rotate_left(1);
        }
        let mut hasher = DigestHasher::new();
        hasher.update(data);
        assert_eq!(!hasher.checksum, c);
    }

    #[test]
    fn verify_accepts_matching_digest() {
        let data = b"payload";
        let result = verify(data, 7, &digest(data));
        assert!(result.verified);
        assert!(result.mismatch.is_none());
    }

    #[test]
    fn verify_rejects_size_mismatch() {
        let result = verify(b"payload", 8, &digest(b"payload"));
        assert!(!result.verified);
        assert_eq!(
            result.mismatch,
            Some(IntegrityMismatch::SizeMismatch {
                local: 7,
                remote: 8
            })
        );
    }

    #[test]
    fn verify_rejects_digest_mismatch() {
        let result = verify(b"payload", 7, &digest(b"pAyload"));
        assert!(!result.verified);
        assert!(matches!(
            result.mismatch,
            Some(IntegrityMismatch::DigestMismatch { .. })
        ));
    }

    #[test]
    fn verify_rejects_malformed_digest() {
        let result = verify(b"payload", 7, "not-a-digest");
        assert!(matches!(
            result.mismatch,
            Some(IntegrityMismatch::MalformedDigest { .. })
        ));
    }

    #[test]
    fn verify_file_matches_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.bin");
        let data: Vec<u8> = (0..50_000u32).map(|i| (i % 13) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        assert_eq!(calculate_file_digest(&path).unwrap(), digest(&data));
        let result = verify_file(&path, data.len() as u64, &digest(&data)).unwrap();
        assert!(result.verified);

        let result = verify_file(&path, 1, &digest(&data)).unwrap();
        assert!(!result.verified);
    }

    #[test]
    fn verify_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(verify_file(&dir.path().join("nope"), 1, "x").is_err());
    }

    #[test]
    fn mismatch_display() {
        let m = IntegrityMismatch::SizeMismatch {
            local: 1,
            remote: 2,
        };
        assert_eq!(m.to_string(), "size mismatch: 1 vs 2");
    }
}
