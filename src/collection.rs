//! Photo collection record and its persistent store.
//!
//! One collection per kiosk, stored under a single key as JSON and rewritten
//! in full on every mutation.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The persisted photo collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoCollection {
    pub id: String,
    /// Saved photos as JPEG data URIs, oldest first
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub printed_photos: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_url: Option<String>,
}

impl PhotoCollection {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: generate_id(now),
            photos: Vec::new(),
            printed_photos: 0,
            created_at: now,
            custom_url: None,
        }
    }
}

/// `photos_<unix millis>_<9 base36 chars>`
pub fn generate_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("photos_{}_{}", now.timestamp_millis(), suffix)
}

/// File name for a photo saved to disk
pub fn saved_photo_filename(now: DateTime<Utc>) -> String {
    format!("foto-{}.jpg", now.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Minimal key/value storage, one string value per key
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Move the value under `key` out of the way, keeping it as `<key>.<tag>`.
    /// Returns where it went.
    fn set_aside(&mut self, key: &str, tag: &str) -> Result<String, StoreError>;
}

/// Stores each key as `<root>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(io_error(&self.root))?;

        // Write-then-rename so a crash never leaves half a record behind
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(io_error(&tmp))?;
        fs::rename(&tmp, &path).map_err(io_error(&path))?;
        Ok(())
    }

    fn set_aside(&mut self, key: &str, tag: &str) -> Result<String, StoreError> {
        let path = self.path_for(key);
        let aside = self.root.join(format!("{}.json.{}", key, tag));
        fs::rename(&path, &aside).map_err(io_error(&path))?;
        Ok(aside.display().to_string())
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError {
    let path = path.to_path_buf();
    move |source| StoreError::Io { path, source }
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn set_aside(&mut self, key: &str, tag: &str) -> Result<String, StoreError> {
        (**self).set_aside(key, tag)
    }
}

/// Session-only storage, used when the data directory is unusable
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn set_aside(&mut self, key: &str, tag: &str) -> Result<String, StoreError> {
        let aside = format!("{}.{}", key, tag);
        if let Some(value) = self.values.remove(key) {
            self.values.insert(aside.clone(), value);
        }
        Ok(aside)
    }
}

/// Owns the collection and keeps storage in sync with it
#[derive(Debug)]
pub struct CollectionStore<S> {
    storage: S,
    collection: PhotoCollection,
}

impl<S: Storage> CollectionStore<S> {
    /// Load the stored collection, creating and persisting a new one if
    /// none exists. An unreadable record is set aside before the new one is
    /// written.
    pub fn open(mut storage: S) -> Result<Self, StoreError> {
        let existing = match storage.get(config::STORAGE_KEY)? {
            Some(json) => match serde_json::from_str::<PhotoCollection>(&json) {
                Ok(collection) => Some(collection),
                Err(e) => {
                    // Keep the unreadable record; never write over it
                    let tag = format!("corrupt-{}", Utc::now().timestamp_millis());
                    let aside = storage.set_aside(config::STORAGE_KEY, &tag)?;
                    log::error!(
                        "Stored collection is unreadable ({}), kept as {} and starting a new one",
                        e,
                        aside
                    );
                    None
                }
            },
            None => None,
        };

        if let Some(collection) = existing {
            log::info!(
                "Loaded collection {} ({} photos, {} printed)",
                collection.id,
                collection.photos.len(),
                collection.printed_photos
            );
            return Ok(Self {
                storage,
                collection,
            });
        }

        let mut store = Self::fresh(storage);
        log::info!("Created collection {}", store.collection.id);
        store.persist()?;
        Ok(store)
    }

    /// New collection that is not written until its first change
    pub fn fresh(storage: S) -> Self {
        Self {
            storage,
            collection: PhotoCollection::new(Utc::now()),
        }
    }

    pub fn collection(&self) -> &PhotoCollection {
        &self.collection
    }

    /// Append a saved photo
    pub fn append(&mut self, photo: String) -> Result<(), StoreError> {
        self.collection.photos.push(photo);
        self.persist()
    }

    /// Count one more print, returning the new total
    pub fn increment_print_count(&mut self) -> Result<u32, StoreError> {
        self.collection.printed_photos += 1;
        self.persist()?;
        Ok(self.collection.printed_photos)
    }

    /// Set or clear the custom share URL
    pub fn set_custom_url(&mut self, url: Option<String>) -> Result<(), StoreError> {
        self.collection.custom_url = url;
        self.persist()
    }

    /// Start a fresh collection with a new id
    pub fn reset(&mut self) -> Result<(), StoreError> {
        let previous = std::mem::replace(&mut self.collection, PhotoCollection::new(Utc::now()));
        while self.collection.id == previous.id {
            self.collection.id = generate_id(self.collection.created_at);
        }
        log::info!("Reset collection {} -> {}", previous.id, self.collection.id);
        self.persist()
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.collection)?;
        self.storage.set(config::STORAGE_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(storage: &MemoryStorage) -> PhotoCollection {
        let json = storage.get(config::STORAGE_KEY).unwrap().unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_id_format() {
        let now = Utc::now();
        let id = generate_id(now);
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "photos");
        assert_eq!(parts[1], now.timestamp_millis().to_string());
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_open_creates_and_persists() {
        let store = CollectionStore::open(MemoryStorage::default()).unwrap();
        let collection = store.collection().clone();
        assert!(collection.photos.is_empty());
        assert_eq!(collection.printed_photos, 0);
        assert_eq!(stored(&store.storage), collection);
    }

    #[test]
    fn test_open_loads_existing() {
        let mut storage = MemoryStorage::default();
        storage
            .set(
                config::STORAGE_KEY,
                r#"{"id":"photos_1_abc","photos":["data:image/jpeg;base64,AA=="],"createdAt":"2024-05-01T10:00:00.000Z"}"#,
            )
            .unwrap();

        let store = CollectionStore::open(storage).unwrap();
        let collection = store.collection();
        assert_eq!(collection.id, "photos_1_abc");
        assert_eq!(collection.photos.len(), 1);
        // Missing counter defaults to zero
        assert_eq!(collection.printed_photos, 0);
        assert!(collection.custom_url.is_none());
    }

    #[test]
    fn test_open_sets_corrupt_record_aside() {
        let mut storage = MemoryStorage::default();
        storage.set(config::STORAGE_KEY, "{ nope").unwrap();

        let store = CollectionStore::open(storage).unwrap();
        assert!(store.collection().id.starts_with("photos_"));
        assert_eq!(stored(&store.storage), *store.collection());

        let kept: Vec<&str> = store
            .storage
            .values
            .iter()
            .filter(|(key, _)| key.starts_with("savedPhotos.corrupt-"))
            .map(|(_, value)| value.as_str())
            .collect();
        assert_eq!(kept, vec!["{ nope"]);
    }

    #[test]
    fn test_unreadable_file_survives_open() {
        let dir = tempfile::tempdir().unwrap();
        let original = r#"{"id":"photos_1_abc","photos":["data:image/jpeg;base64,AA==","data:image/jpeg;base64,AQ=="],"printedPhotos":3,"createdAt":"2024-05-01"}"#;
        std::fs::write(dir.path().join("savedPhotos.json"), original).unwrap();

        let store = CollectionStore::open(FileStorage::new(dir.path())).unwrap();
        assert_ne!(store.collection().id, "photos_1_abc");
        assert!(store.collection().photos.is_empty());

        let backups: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("savedPhotos.json.corrupt-"))
            .collect();
        assert_eq!(backups.len(), 1);
        let kept = std::fs::read_to_string(dir.path().join(&backups[0])).unwrap();
        assert_eq!(kept, original);

        // The new record is readable on the next start
        let reopened = CollectionStore::open(FileStorage::new(dir.path())).unwrap();
        assert_eq!(reopened.collection().id, store.collection().id);
    }

    #[test]
    fn test_fresh_store_writes_on_first_change() {
        let mut store = CollectionStore::fresh(MemoryStorage::default());
        assert!(store.storage.get(config::STORAGE_KEY).unwrap().is_none());

        store.append("p1".into()).unwrap();
        assert_eq!(stored(&store.storage).photos, vec!["p1".to_string()]);
    }

    #[test]
    fn test_append_preserves_order() {
        let mut store = CollectionStore::open(MemoryStorage::default()).unwrap();
        let photos: Vec<String> = (0..5).map(|i| format!("photo-{}", i)).collect();
        for photo in &photos {
            store.append(photo.clone()).unwrap();
        }
        assert_eq!(store.collection().photos, photos);
        assert_eq!(stored(&store.storage).photos, photos);
    }

    #[test]
    fn test_print_count_persists() {
        let mut store = CollectionStore::open(MemoryStorage::default()).unwrap();
        assert_eq!(store.increment_print_count().unwrap(), 1);
        assert_eq!(store.increment_print_count().unwrap(), 2);
        assert_eq!(stored(&store.storage).printed_photos, 2);
    }

    #[test]
    fn test_reset_clears_everything_with_new_id() {
        let mut store = CollectionStore::open(MemoryStorage::default()).unwrap();
        store.append("a".into()).unwrap();
        store.increment_print_count().unwrap();
        store
            .set_custom_url(Some("https://example.com/x".into()))
            .unwrap();
        let old_id = store.collection().id.clone();

        store.reset().unwrap();
        let collection = store.collection();
        assert!(collection.photos.is_empty());
        assert_eq!(collection.printed_photos, 0);
        assert!(collection.custom_url.is_none());
        assert_ne!(collection.id, old_id);
        assert_eq!(stored(&store.storage), *collection);
    }

    #[test]
    fn test_json_field_names() {
        let mut collection = PhotoCollection::new(Utc::now());
        collection.custom_url = Some("https://example.com".into());
        let value = serde_json::to_value(&collection).unwrap();
        for field in ["id", "photos", "printedPhotos", "createdAt", "customUrl"] {
            assert!(value.get(field).is_some(), "missing {}", field);
        }

        collection.custom_url = None;
        let value = serde_json::to_value(&collection).unwrap();
        assert!(value.get("customUrl").is_none());
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested");
        let mut storage = FileStorage::new(&root);
        assert!(storage.get("savedPhotos").unwrap().is_none());

        storage.set("savedPhotos", "{\"a\":1}").unwrap();
        assert_eq!(
            storage.get("savedPhotos").unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        assert!(root.join("savedPhotos.json").exists());
        assert!(!root.join("savedPhotos.json.tmp").exists());
    }

    #[test]
    fn test_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let mut store = CollectionStore::open(FileStorage::new(dir.path())).unwrap();
            store.append("p1".into()).unwrap();
            store.collection().id.clone()
        };

        let store = CollectionStore::open(FileStorage::new(dir.path())).unwrap();
        assert_eq!(store.collection().id, id);
        assert_eq!(store.collection().photos, vec!["p1".to_string()]);
    }

    #[test]
    fn test_saved_photo_filename() {
        let now = DateTime::parse_from_rfc3339("2024-05-01T10:00:00.123Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(saved_photo_filename(now), "foto-2024-05-01T10:00:00.123Z.jpg");
    }
}
