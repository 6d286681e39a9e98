//! Conversation storage as one JSON file per conversation
//!
//! Files live in a single directory named `<id>.json`. The directory is created the first
//! time a conversation is written.
//!
//! There is no locking: two concurrent writes to the same conversation race and the last
//! writer wins, dropping the other exchange. Each conversation is its own file, so a failed
//! or corrupt write never touches other conversations.

use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::conversation::{self, is_valid_id, ChatSummary, Conversation, Message};

const EXTENSION: &str = "json";

/// Errors from the conversation store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid chat id: {0:?}")]
    InvalidId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed chat file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// File-backed conversation store
#[derive(Debug, Clone)]
pub struct ChatStore {
    dir: PathBuf,
}

impl ChatStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", id, EXTENSION))
    }

    /// Append an exchange to `id`, or start a new conversation when `id` is absent,
    /// malformed, or has no stored file.
    pub async fn append_or_create(
        &self,
        id: Option<&str>,
        prompt: &str,
        response: &str,
    ) -> Result<Conversation, StoreError> {
        let now = conversation::now();
        let message = Message {
            prompt: prompt.to_string(),
            response: response.to_string(),
            timestamp: now,
        };

        let requested = id.filter(|id| is_valid_id(id));
        let existing = match requested {
            Some(id) => self.get(id).await?.map(|conversation| (id, conversation)),
            None => None,
        };

        let conversation = match existing {
            Some((id, mut conversation)) => {
                // The file name is authoritative; a stale or edited `id` field must not
                // redirect the write to another file.
                if conversation.id != id {
                    tracing::warn!(
                        "Chat file {} carries id {:?}, keeping the file name",
                        id,
                        conversation.id
                    );
                    conversation.id = id.to_string();
                }
                conversation.push(message);
                conversation
            }
            None => {
                if let Some(id) = id {
                    tracing::debug!("Chat {} not found, starting a new one", id);
                }
                let id = self.mint_id(now).await?;
                Conversation::new(id, message)
            }
        };

        self.save(&conversation).await?;
        Ok(conversation)
    }

    /// Ids are the creation time in milliseconds, bumped past any id already on disk.
    async fn mint_id(&self, now: DateTime<Utc>) -> Result<String, StoreError> {
        let mut candidate = now.timestamp_millis();
        loop {
            let id = candidate.to_string();
            if !fs::try_exists(self.path_for(&id)).await? {
                return Ok(id);
            }
            candidate += 1;
        }
    }

    /// Write a conversation, replacing any previous version of it
    pub async fn save(&self, conversation: &Conversation) -> Result<(), StoreError> {
        if !is_valid_id(&conversation.id) {
            return Err(StoreError::InvalidId(conversation.id.clone()));
        }
        fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(&conversation.id);
        let content = serde_json::to_string_pretty(conversation).map_err(|source| {
            StoreError::Json {
                path: path.clone(),
                source,
            }
        })?;

        // Write beside the target and rename so readers never see a half-written file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &path).await?;

        tracing::debug!(
            "Saved chat {} ({} messages)",
            conversation.id,
            conversation.messages.len()
        );
        Ok(())
    }

    /// Load a conversation, or `None` when no file exists for `id`
    pub async fn get(&self, id: &str) -> Result<Option<Conversation>, StoreError> {
        if !is_valid_id(id) {
            return Ok(None);
        }
        self.read(&self.path_for(id)).await
    }

    async fn read(&self, path: &Path) -> Result<Option<Conversation>, StoreError> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StoreError::Json {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Summaries of every stored conversation, most recent first
    pub async fn list(&self) -> Result<Vec<ChatSummary>, StoreError> {
        let mut summaries = Vec::new();

        for path in self.chat_files().await? {
            if let Some(conversation) = self.read(&path).await? {
                summaries.push(conversation.summary());
            }
        }

        summaries.sort_by(|a, b| b.last_timestamp.cmp(&a.last_timestamp));
        Ok(summaries)
    }

    async fn chat_files(&self) -> Result<Vec<PathBuf>, StoreError> {
        let mut read_dir = match fs::read_dir(&self.dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_file()
                && path.extension().map_or(false, |ext| ext == EXTENSION)
            {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    /// Remove every stored file.
    ///
    /// Returns `None` if the storage directory does not exist, otherwise the number of
    /// files removed.
    pub async fn delete_all(&self) -> Result<Option<usize>, StoreError> {
        let Some(files) = self.file_names().await? else {
            return Ok(None);
        };

        for name in &files {
            fs::remove_file(self.dir.join(name)).await?;
        }

        tracing::info!("Removed {} chat file(s)", files.len());
        Ok(Some(files.len()))
    }

    /// Names of the files in the storage directory, sorted, or `None` if it does not exist
    pub async fn file_names(&self) -> Result<Option<Vec<String>>, StoreError> {
        let mut read_dir = match fs::read_dir(&self.dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(Some(names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tokio_test::assert_ok;

    struct TempStore {
        store: ChatStore,
    }

    impl TempStore {
        fn new() -> Self {
            let dir = std::env::temp_dir().join(format!("ai_assistant_test_{}", uuid::Uuid::new_v4()));
            Self {
                store: ChatStore::new(dir),
            }
        }
    }

    impl Drop for TempStore {
        fn drop(&mut self) {
            std::fs::remove_dir_all(self.store.dir()).ok();
        }
    }

    fn conversation(id: &str, prompt: &str, ms: i64) -> Conversation {
        Conversation::new(
            id,
            Message {
                prompt: prompt.to_string(),
                response: "ok".to_string(),
                timestamp: Utc.timestamp_millis_opt(ms).unwrap(),
            },
        )
    }

    #[tokio::test]
    async fn test_create_without_id() {
        let temp = TempStore::new();
        let store = &temp.store;

        assert!(!store.dir().exists());
        let conv = store.append_or_create(None, "Hello", "Hi!").await.unwrap();

        assert!(conv.id.parse::<i64>().is_ok());
        assert_eq!(conv.messages.len(), 1);
        assert_eq!(conv.messages[0].prompt, "Hello");
        assert_eq!(conv.messages[0].response, "Hi!");
        assert_eq!(conv.timestamp, conv.messages[0].timestamp);

        let loaded = store.get(&conv.id).await.unwrap().unwrap();
        assert_eq!(loaded, conv);
    }

    #[tokio::test]
    async fn test_append_to_existing() {
        let temp = TempStore::new();
        let store = &temp.store;

        let first = store.append_or_create(None, "one", "1").await.unwrap();
        let second = store
            .append_or_create(Some(first.id.as_str()), "two", "2")
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.messages.len(), 2);
        assert_eq!(second.messages[0], first.messages[0]);
        assert_eq!(second.messages[1].prompt, "two");
        assert_eq!(second.timestamp, second.messages[1].timestamp);

        let loaded = store.get(&first.id).await.unwrap().unwrap();
        assert_eq!(loaded, second);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_returned_matches_reloaded() {
        let temp = TempStore::new();
        let store = &temp.store;

        let created = store.append_or_create(None, "one", "1").await.unwrap();
        assert_eq!(created.timestamp.timestamp_subsec_nanos() % 1_000_000, 0);
        assert_eq!(store.get(&created.id).await.unwrap(), Some(created.clone()));

        let appended = store
            .append_or_create(Some(created.id.as_str()), "two", "2")
            .await
            .unwrap();
        assert_eq!(store.get(&created.id).await.unwrap(), Some(appended));
    }

    #[tokio::test]
    async fn test_append_keeps_file_name_id() {
        let temp = TempStore::new();
        let store = &temp.store;

        // A file whose body id disagrees with its name
        std::fs::create_dir_all(store.dir()).unwrap();
        let stored = conversation("other", "first", 1_000);
        std::fs::write(
            store.dir().join("5.json"),
            serde_json::to_string(&stored).unwrap(),
        )
        .unwrap();

        let conv = store.append_or_create(Some("5"), "second", "2").await.unwrap();

        assert_eq!(conv.id, "5");
        assert_eq!(conv.messages.len(), 2);
        assert_eq!(store.get("5").await.unwrap(), Some(conv));
        assert!(!store.dir().join("other.json").exists());
    }

    #[tokio::test]
    async fn test_body_id_cannot_escape_dir() {
        let temp = TempStore::new();
        let store = &temp.store;
        let parent = store.dir().parent().unwrap().to_path_buf();
        let escaped = format!("escaped_{}", uuid::Uuid::new_v4());

        std::fs::create_dir_all(store.dir()).unwrap();
        let body = format!(
            r#"{{"id":"sub/../../{}","messages":[],"timestamp":"2024-05-01T10:20:30.123Z"}}"#,
            escaped
        );
        std::fs::write(store.dir().join("7.json"), body).unwrap();

        let conv = store.append_or_create(Some("7"), "Hello", "Hi!").await.unwrap();

        assert_eq!(conv.id, "7");
        assert!(!parent.join(format!("{}.json", escaped)).exists());
        assert_eq!(
            store.file_names().await.unwrap(),
            Some(vec!["7.json".to_string()])
        );
    }

    #[tokio::test]
    async fn test_save_rejects_invalid_id() {
        let temp = TempStore::new();
        let store = &temp.store;

        let result = store.save(&conversation("../outside", "x", 1_000)).await;
        assert!(matches!(result, Err(StoreError::InvalidId(id)) if id == "../outside"));
        assert!(!store.dir().exists());
    }

    #[tokio::test]
    async fn test_unknown_id_creates_new() {
        let temp = TempStore::new();
        let store = &temp.store;

        let conv = store
            .append_or_create(Some("999"), "Hello", "Hi!")
            .await
            .unwrap();

        assert_ne!(conv.id, "999");
        assert_eq!(conv.messages.len(), 1);
        assert!(store.get("999").await.unwrap().is_none());
        assert!(store.get(&conv.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_invalid_id_creates_new() {
        let temp = TempStore::new();
        let store = &temp.store;

        let conv = store
            .append_or_create(Some("../escape"), "Hello", "Hi!")
            .await
            .unwrap();

        assert!(is_valid_id(&conv.id));
        assert!(store.get("../escape").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ids_are_distinct() {
        let temp = TempStore::new();
        let store = &temp.store;

        let mut ids = Vec::new();
        for i in 0..5 {
            let conv = store
                .append_or_create(None, &format!("prompt {}", i), "ok")
                .await
                .unwrap();
            ids.push(conv.id);
        }

        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }

    #[tokio::test]
    async fn test_list_sorted_newest_first() {
        let temp = TempStore::new();
        let store = &temp.store;

        assert_ok!(store.save(&conversation("1", "oldest", 1_000)).await);
        assert_ok!(store.save(&conversation("3", "newest", 9_000)).await);
        assert_ok!(store.save(&conversation("2", "middle", 5_000)).await);

        let prompts: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.last_prompt)
            .collect();
        assert_eq!(prompts, vec!["newest", "middle", "oldest"]);
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_empty() {
        let temp = TempStore::new();
        assert!(temp.store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_missing() {
        let temp = TempStore::new();
        assert!(temp.store.get("12345").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let temp = TempStore::new();
        let store = &temp.store;

        assert_ok!(store.save(&conversation("1", "fine", 1_000)).await);
        std::fs::write(store.dir().join("2.json"), "{ not json").unwrap();

        assert!(matches!(
            store.get("2").await,
            Err(StoreError::Json { .. })
        ));
        assert!(store.list().await.is_err());
        // The healthy conversation is untouched
        assert!(store.get("1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_all() {
        let temp = TempStore::new();
        let store = &temp.store;

        assert_eq!(store.delete_all().await.unwrap(), None);

        store.append_or_create(None, "a", "1").await.unwrap();
        store.append_or_create(None, "b", "2").await.unwrap();

        assert_eq!(store.delete_all().await.unwrap(), Some(2));
        assert!(store.list().await.unwrap().is_empty());

        // Idempotent on an empty directory
        assert_eq!(store.delete_all().await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_file_names() {
        let temp = TempStore::new();
        let store = &temp.store;

        assert_eq!(store.file_names().await.unwrap(), None);

        assert_ok!(store.save(&conversation("20", "b", 2_000)).await);
        assert_ok!(store.save(&conversation("10", "a", 1_000)).await);

        assert_eq!(
            store.file_names().await.unwrap(),
            Some(vec!["10.json".to_string(), "20.json".to_string()])
        );
    }
}
