//! Stable comment identity hashes.
//!
//! A fingerprint identifies one published comment across runs. It hashes the
//! stage/stack identity and the configured title only — never template or
//! diff content — so a comment survives content changes and can be updated
//! in place commit after commit.

use sha2::{Digest, Sha256};

const STAGE_DOMAIN: &[u8] = b"stage";
const UNIT_DOMAIN: &[u8] = b"unit";

/// Fingerprint for a stage-level comment covering `unit_ids` in order.
pub fn stage_fingerprint(stage_id: &str, title: Option<&str>, unit_ids: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(STAGE_DOMAIN);
    push_component(&mut hasher, stage_id);
    push_component(&mut hasher, title.unwrap_or(""));
    for id in unit_ids {
        push_component(&mut hasher, id);
    }
    format!("{:x}", hasher.finalize())
}

/// Fingerprint for a single stack's comment, used in fallback publishing.
pub fn unit_fingerprint(stage_id: &str, unit_id: &str, title: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(UNIT_DOMAIN);
    push_component(&mut hasher, stage_id);
    push_component(&mut hasher, unit_id);
    push_component(&mut hasher, title.unwrap_or(""));
    format!("{:x}", hasher.finalize())
}

// Length-prefix each component so ["ab","c"] and ["a","bc"] never collide.
fn push_component(hasher: &mut Sha256, component: &str) {
    hasher.update((component.len() as u64).to_le_bytes());
    hasher.update(component.as_bytes());
}
