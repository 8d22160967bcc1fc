//! SQLite schema for the exemplar embedding cache
//!
//! Vectors are only reusable for the exact exemplar set (fingerprint) and
//! embedding model (provider id) that produced them.

pub const SCHEMA: &str = r#"
-- ============================================
-- EXEMPLAR SETS
-- ============================================

CREATE TABLE IF NOT EXISTS exemplar_sets (
    fingerprint TEXT NOT NULL,             -- SHA-256 of version + phrases
    provider_id TEXT NOT NULL,             -- 'hashed:fnv1a-v1:512', 'ollama:bge-m3'
    version TEXT NOT NULL,                 -- Human label, e.g. 'builtin-v1'
    phrase_count INTEGER NOT NULL,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (fingerprint, provider_id)
);

-- ============================================
-- EXEMPLAR VECTORS
-- ============================================

CREATE TABLE IF NOT EXISTS exemplar_vectors (
    fingerprint TEXT NOT NULL,
    provider_id TEXT NOT NULL,
    position INTEGER NOT NULL,             -- Index in the exemplar list
    phrase TEXT NOT NULL,
    vector TEXT NOT NULL,                  -- JSON array of f32
    PRIMARY KEY (fingerprint, provider_id, position),
    FOREIGN KEY (fingerprint, provider_id)
        REFERENCES exemplar_sets(fingerprint, provider_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_exemplar_sets_provider ON exemplar_sets(provider_id);
"#;
