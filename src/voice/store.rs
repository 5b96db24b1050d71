//! Voice metadata and audio persistence.
//!
//! Metadata lives in a single `voices.json` index next to the raw audio
//! files. Index writes are read-modify-write of the whole file and are
//! serialized through an internal mutex; reads go straight to disk.

use crate::error::{Result, VocastError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

/// A cloned voice: a label plus a stored reference recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voice {
    pub id: String,
    pub label: String,
    pub file_name: String,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct VoiceIndex {
    voices: Vec<Voice>,
}

/// Flat file store for cloned voices.
pub struct VoiceStore {
    dir: PathBuf,
    index_path: PathBuf,
    // Serializes read-modify-write cycles on voices.json
    write_lock: Mutex<()>,
}

impl VoiceStore {
    /// Create a store rooted at `dir`. Call [`ensure_dirs`](Self::ensure_dirs)
    /// before first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let index_path = dir.join("voices.json");
        Self {
            dir,
            index_path,
            write_lock: Mutex::new(()),
        }
    }

    /// Create the storage directory and an empty index if missing.
    pub async fn ensure_dirs(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| VocastError::Storage {
                message: format!("failed to create {}: {e}", self.dir.display()),
            })?;
        if !self.index_path.exists() {
            self.write_index(&VoiceIndex::default()).await?;
        }
        Ok(())
    }

    /// All stored voices, in insertion order.
    pub async fn list(&self) -> Result<Vec<Voice>> {
        Ok(self.read_index().await.voices)
    }

    /// Look up a voice by id. Absent ids are `Ok(None)`, not an error.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Voice>> {
        let index = self.read_index().await;
        Ok(index.voices.into_iter().find(|v| v.id == id))
    }

    /// Persist a new voice: audio bytes on disk, metadata in the index.
    pub async fn save(&self, label: &str, audio: &[u8], mime_type: &str) -> Result<Voice> {
        let _guard = self.write_lock.lock().await;

        let id = Uuid::new_v4().to_string();
        let file_name = format!("{id}{}", extension_for_mime(mime_type));
        let file_path = self.dir.join(&file_name);

        tokio::fs::write(&file_path, audio)
            .await
            .map_err(|e| VocastError::Storage {
                message: format!("failed to write {}: {e}", file_path.display()),
            })?;

        let voice = Voice {
            id,
            label: label.to_string(),
            file_name,
            mime_type: mime_type.to_string(),
            created_at: Utc::now(),
        };

        let mut index = self.read_index().await;
        index.voices.push(voice.clone());
        self.write_index(&index).await?;

        Ok(voice)
    }

    /// Delete a voice and its audio file. Unknown ids are an error; an
    /// already-missing audio file is not.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut index = self.read_index().await;
        let position = index
            .voices
            .iter()
            .position(|v| v.id == id)
            .ok_or_else(|| VocastError::not_found("Voice", id))?;

        let voice = index.voices.remove(position);
        let file_path = self.dir.join(&voice.file_name);
        if let Err(e) = tokio::fs::remove_file(&file_path).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            return Err(VocastError::Storage {
                message: format!("failed to remove {}: {e}", file_path.display()),
            });
        }

        self.write_index(&index).await
    }

    /// Absolute path of a voice's stored audio file.
    pub fn file_path(&self, voice: &Voice) -> PathBuf {
        self.dir.join(&voice.file_name)
    }

    // Missing or corrupt index reads as empty; the next write repairs it.
    async fn read_index(&self) -> VoiceIndex {
        match tokio::fs::read_to_string(&self.index_path).await {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            Err(_) => VoiceIndex::default(),
        }
    }

    async fn write_index(&self, index: &VoiceIndex) -> Result<()> {
        let json = serde_json::to_string_pretty(index).map_err(|e| VocastError::Storage {
            message: format!("failed to serialize voice index: {e}"),
        })?;
        tokio::fs::write(&self.index_path, json)
            .await
            .map_err(|e| VocastError::Storage {
                message: format!("failed to write {}: {e}", self.index_path.display()),
            })
    }
}

/// File extension for a stored voice, derived from its mime type.
///
/// Unknown types fall back to `.webm`, the format browsers record in.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "audio/webm" => ".webm",
        "audio/wav" | "audio/wave" | "audio/x-wav" => ".wav",
        "audio/mpeg" | "audio/mp3" => ".mp3",
        "audio/ogg" => ".ogg",
        "audio/mp4" => ".m4a",
        _ => ".webm",
    }
}

/// Mime type guessed from a file extension, for serving stored audio back
/// and for building reference-audio data URIs.
pub fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        Some("m4a") => "audio/mp4",
        _ => "audio/webm",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store() -> (TempDir, VoiceStore) {
        let dir = TempDir::new().unwrap();
        let store = VoiceStore::new(dir.path().join("voices"));
        store.ensure_dirs().await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_ensure_dirs_creates_empty_index() {
        let (_dir, store) = store().await;
        assert!(store.index_path.exists());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_persists_audio_and_metadata() {
        let (_dir, store) = store().await;

        let voice = store
            .save("Narrator", b"fake audio", "audio/webm")
            .await
            .unwrap();

        assert_eq!(voice.label, "Narrator");
        assert_eq!(voice.mime_type, "audio/webm");
        assert!(voice.file_name.ends_with(".webm"));

        let on_disk = tokio::fs::read(store.file_path(&voice)).await.unwrap();
        assert_eq!(on_disk, b"fake audio");
    }

    #[tokio::test]
    async fn test_find_by_id_returns_saved_voice() {
        let (_dir, store) = store().await;

        let saved = store.save("Host", b"audio", "audio/wav").await.unwrap();
        let found = store.find_by_id(&saved.id).await.unwrap();

        assert_eq!(found, Some(saved));
    }

    #[tokio::test]
    async fn test_find_by_id_unknown_is_none() {
        let (_dir, store) = store().await;
        assert_eq!(store.find_by_id("no-such-voice").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let (_dir, store) = store().await;

        let a = store.save("A", b"a", "audio/webm").await.unwrap();
        let b = store.save("B", b"b", "audio/webm").await.unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(
            listed.iter().map(|v| v.id.as_str()).collect::<Vec<_>>(),
            vec![a.id.as_str(), b.id.as_str()]
        );
    }

    #[tokio::test]
    async fn test_delete_removes_entry_and_file() {
        let (_dir, store) = store().await;

        let voice = store.save("Gone", b"bytes", "audio/mpeg").await.unwrap();
        let file_path = store.file_path(&voice);
        assert!(file_path.exists());

        store.delete(&voice.id).await.unwrap();

        assert!(!file_path.exists());
        assert_eq!(store.find_by_id(&voice.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_not_found() {
        let (_dir, store) = store().await;
        let err = store.delete("missing").await.unwrap_err();
        assert!(matches!(err, VocastError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_tolerates_missing_audio_file() {
        let (_dir, store) = store().await;

        let voice = store.save("Ghost", b"bytes", "audio/webm").await.unwrap();
        tokio::fs::remove_file(store.file_path(&voice)).await.unwrap();

        store.delete(&voice.id).await.unwrap();
        assert_eq!(store.find_by_id(&voice.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_index_reads_as_empty() {
        let (_dir, store) = store().await;
        store.save("A", b"a", "audio/webm").await.unwrap();

        tokio::fs::write(&store.index_path, "not json at all")
            .await
            .unwrap();

        assert!(store.list().await.unwrap().is_empty());
    }

    #[test]
    fn test_extension_for_mime_known_types() {
        assert_eq!(extension_for_mime("audio/webm"), ".webm");
        assert_eq!(extension_for_mime("audio/wav"), ".wav");
        assert_eq!(extension_for_mime("audio/x-wav"), ".wav");
        assert_eq!(extension_for_mime("audio/mpeg"), ".mp3");
        assert_eq!(extension_for_mime("audio/mp3"), ".mp3");
        assert_eq!(extension_for_mime("audio/ogg"), ".ogg");
        assert_eq!(extension_for_mime("audio/mp4"), ".m4a");
    }

    #[test]
    fn test_extension_for_mime_unknown_falls_back_to_webm() {
        assert_eq!(extension_for_mime("video/quicktime"), ".webm");
    }

    #[test]
    fn test_mime_for_path_known_and_unknown() {
        assert_eq!(mime_for_path(Path::new("x.wav")), "audio/wav");
        assert_eq!(mime_for_path(Path::new("x.MP3")), "audio/mpeg");
        assert_eq!(mime_for_path(Path::new("x.ogg")), "audio/ogg");
        assert_eq!(mime_for_path(Path::new("x.m4a")), "audio/mp4");
        assert_eq!(mime_for_path(Path::new("x.unknown")), "audio/webm");
        assert_eq!(mime_for_path(Path::new("noext")), "audio/webm");
    }

    #[test]
    fn test_voice_serializes_camel_case() {
        let voice = Voice {
            id: "v1".to_string(),
            label: "Test".to_string(),
            file_name: "v1.webm".to_string(),
            mime_type: "audio/webm".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&voice).unwrap();
        assert!(json.contains("\"fileName\""));
        assert!(json.contains("\"mimeType\""));
        assert!(json.contains("\"createdAt\""));
    }
}
