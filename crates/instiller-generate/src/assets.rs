use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use crate::errors::{GenerationError, Result};

/// Word lists read from disk, cached per path, handed out in a cycle.
#[derive(Debug, Default)]
pub struct LineCache {
    lines: RwLock<BTreeMap<PathBuf, Arc<Vec<String>>>>,
    cursors: Mutex<BTreeMap<PathBuf, usize>>,
}

impl LineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next line of `path`, wrapping to the first after the last.
    pub fn next_line(&self, path: &Path) -> Result<String> {
        let lines = self.load(path)?;
        if lines.is_empty() {
            return Err(GenerationError::Configuration(format!(
                "word list {} has no entries",
                path.display()
            )));
        }

        let mut cursors = self
            .cursors
            .lock()
            .map_err(|_| GenerationError::Configuration("line cursor poisoned".to_string()))?;
        let cursor = cursors.entry(path.to_path_buf()).or_insert(0);
        let line = lines[*cursor % lines.len()].clone();
        *cursor = (*cursor + 1) % lines.len();
        Ok(line)
    }

    /// Non-blank, trimmed lines of `path`.
    pub fn load(&self, path: &Path) -> Result<Arc<Vec<String>>> {
        if let Some(lines) = self.cached(path) {
            return Ok(lines);
        }

        let contents = fs::read_to_string(path)?;
        let lines: Arc<Vec<String>> = Arc::new(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        );

        let mut cache = self
            .lines
            .write()
            .map_err(|_| GenerationError::Configuration("line cache poisoned".to_string()))?;
        cache.insert(path.to_path_buf(), Arc::clone(&lines));
        Ok(lines)
    }

    fn cached(&self, path: &Path) -> Option<Arc<Vec<String>>> {
        let cache = self.lines.read().ok()?;
        cache.get(path).cloned()
    }
}
