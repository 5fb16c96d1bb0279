//! Translation cache
//!
//! Stores strings that have already been machine-translated so each
//! `(target language, text)` pair is sent to the external translator at most
//! once. The translator itself is supplied by the caller.
//!
//! Entries are keyed by the SHA-256 of the target language and source text,
//! so long review bodies do not end up in an index.

use std::future::Future;

use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::{Error, Result};

/// Cache key for `text` translated into `target_lang`
pub fn cache_key(text: &str, target_lang: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(target_lang.trim().to_ascii_lowercase().as_bytes());
    hasher.update([0u8]);
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// SQLite-backed translation cache
#[derive(Clone)]
pub struct TranslationCache {
    db: SqlitePool,
}

impl TranslationCache {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Cached translation, if any
    pub async fn get(&self, text: &str, target_lang: &str) -> Result<Option<String>> {
        let translated: Option<String> =
            sqlx::query_scalar("SELECT translated_text FROM translation_cache WHERE cache_key = ?")
                .bind(cache_key(text, target_lang))
                .fetch_optional(&self.db)
                .await?;

        Ok(translated)
    }

    /// Store (or replace) a translation
    pub async fn put(&self, text: &str, target_lang: &str, translated: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO translation_cache (cache_key, target_lang, source_text, translated_text)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(cache_key) DO UPDATE SET
                translated_text = excluded.translated_text,
                created_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(cache_key(text, target_lang))
        .bind(target_lang.trim().to_ascii_lowercase())
        .bind(text)
        .bind(translated)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Cached translation, or call `translate` and cache its result
    ///
    /// Empty or whitespace-only text is returned unchanged without a lookup.
    pub async fn get_or_translate<F, Fut>(
        &self,
        text: &str,
        target_lang: &str,
        translate: F,
    ) -> Result<String>
    where
        F: FnOnce(String, String) -> Fut,
        Fut: Future<Output = anyhow::Result<String>>,
    {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        if let Some(cached) = self.get(text, target_lang).await? {
            debug!(target_lang, "Translation cache hit");
            return Ok(cached);
        }

        let translated = translate(text.to_string(), target_lang.to_string())
            .await
            .map_err(|e| {
                warn!(target_lang, error = %e, "Translator failed");
                Error::Translation(e.to_string())
            })?;

        self.put(text, target_lang, &translated).await?;
        Ok(translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_depends_on_language() {
        assert_ne!(cache_key("hello", "fr"), cache_key("hello", "de"));
        assert_ne!(cache_key("hello", "fr"), cache_key("hello!", "fr"));
    }

    #[test]
    fn test_cache_key_normalizes_language() {
        assert_eq!(cache_key("hello", "FR"), cache_key("hello", " fr "));
    }

    #[test]
    fn test_cache_key_separates_language_from_text() {
        // "f" + "rhello" must not collide with "fr" + "hello"
        assert_ne!(cache_key("rhello", "f"), cache_key("hello", "fr"));
    }

    #[test]
    fn test_cache_key_is_hex_sha256() {
        let key = cache_key("hello", "fr");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
