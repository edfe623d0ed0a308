use std::cell::RefCell;
use std::collections::HashMap;
use std::path::MAIN_SEPARATOR;

/// Collaborator contract of the `path` built-in type: enumerate directory entries
/// completing `prefix`. Must be safe to call repeatedly; implementations may cache.
pub trait CompletePath {
    fn complete_path(&self, prefix: &str) -> Vec<String>;
}

/// Default filesystem enumerator with a per-directory cache.
#[derive(Default)]
pub struct FilesystemPathCompleter {
    cache: RefCell<HashMap<String, Vec<String>>>,
}

impl FilesystemPathCompleter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }

    fn entries_of(&self, dir: &str) -> Vec<String> {
        if let Some(entries) = self.cache.borrow().get(dir) {
            return entries.clone();
        }
        let mut entries = Vec::new();
        if let Ok(read_dir) = std::fs::read_dir(if dir.is_empty() { "." } else { dir }) {
            for entry in read_dir.flatten() {
                let path = if dir.is_empty() {
                    entry.file_name().to_string_lossy().into_owned()
                } else {
                    entry.path().to_string_lossy().into_owned()
                };
                entries.push(path);
            }
        }
        entries.sort();
        self.cache
            .borrow_mut()
            .insert(dir.to_string(), entries.clone());
        entries
    }
}

impl CompletePath for FilesystemPathCompleter {
    fn complete_path(&self, prefix: &str) -> Vec<String> {
        let dir = match prefix.rfind(MAIN_SEPARATOR) {
            Some(idx) => &prefix[..idx + 1],
            None => "",
        };
        self.entries_of(dir)
            .into_iter()
            .filter(|entry| entry.starts_with(prefix))
            .collect()
    }
}
