use std::path::Path;

use ahash::AHashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::utils::generate_id;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wordlist {
    pub id: String,
    pub name: String,
    pub words: Vec<String>,
}

/// Read-only view the job engine has of wordlist storage.
pub trait WordlistProvider: Send + Sync {
    fn get(&self, id: &str) -> Option<Wordlist>;
}

/// In-memory wordlist table. Lists are either uploaded through the API or
/// loaded from a directory of `.txt` files at startup.
pub struct WordlistManager {
    lists: RwLock<AHashMap<String, Wordlist>>,
}

impl WordlistManager {
    pub fn new() -> Self {
        Self { lists: RwLock::new(AHashMap::new()) }
    }

    /// Load every `.txt` file under `dir` as a wordlist named after the file
    /// stem. Creates the directory if it does not exist yet.
    pub fn load_dir(&self, dir: &Path) -> anyhow::Result<usize> {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }
        let mut loaded = 0;
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else { continue };
            let data = std::fs::read_to_string(&path)?;
            let words: Vec<String> = data
                .lines()
                .map(str::trim)
                .filter(|w| !w.is_empty())
                .map(str::to_string)
                .collect();
            let id = self.add(name, words);
            tracing::debug!(%id, name, path = %path.display(), "loaded wordlist file");
            loaded += 1;
        }
        Ok(loaded)
    }

    pub fn add(&self, name: &str, words: Vec<String>) -> String {
        let id = generate_id();
        tracing::info!(%id, name, count = words.len(), "added wordlist");
        self.lists.write().insert(
            id.clone(),
            Wordlist { id: id.clone(), name: name.to_string(), words },
        );
        id
    }

    pub fn get_by_name(&self, name: &str) -> Option<Wordlist> {
        self.lists.read().values().find(|w| w.name == name).cloned()
    }

    pub fn list(&self) -> Vec<Wordlist> {
        self.lists.read().values().cloned().collect()
    }
}

impl WordlistProvider for WordlistManager {
    fn get(&self, id: &str) -> Option<Wordlist> {
        self.lists.read().get(id).cloned()
    }
}

impl Default for WordlistManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_get() {
        let mgr = WordlistManager::new();
        let id = mgr.add("common", vec!["admin".into(), "login".into()]);

        let wl = mgr.get(&id).unwrap();
        assert_eq!(wl.name, "common");
        assert_eq!(wl.words, vec!["admin", "login"]);

        assert!(mgr.get("missing").is_none());
        assert_eq!(mgr.get_by_name("common").unwrap().id, id);
        assert!(mgr.get_by_name("nope").is_none());
        assert_eq!(mgr.list().len(), 1);
    }

    #[test]
    fn load_dir_reads_txt_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("small.txt"), "admin\n\n  api  \nwww\n").unwrap();
        std::fs::write(dir.path().join("ignored.csv"), "a,b,c").unwrap();

        let mgr = WordlistManager::new();
        let loaded = mgr.load_dir(dir.path()).unwrap();
        assert_eq!(loaded, 1);

        let wl = mgr.get_by_name("small").unwrap();
        assert_eq!(wl.words, vec!["admin", "api", "www"]);
    }

    #[test]
    fn load_dir_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("lists");
        let mgr = WordlistManager::new();
        assert_eq!(mgr.load_dir(&sub).unwrap(), 0);
        assert!(sub.exists());
    }
}
