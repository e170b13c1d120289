use std::collections::BTreeMap;

use instiller_core::FieldKey;

/// Bounds how deep a type graph may re-enter its own types.
///
/// The guard tracks the composite types under construction. A field whose
/// composite type already sits on that path `k` times is entered only while
/// `k <= level`; otherwise the field stays absent.
#[derive(Debug, Clone)]
pub struct RecursionGuard {
    level: usize,
    path: Vec<String>,
    visits: BTreeMap<FieldKey, u64>,
}

impl RecursionGuard {
    /// Guard allowing `level` re-entries of a type.
    pub fn new(level: usize) -> Self {
        Self {
            level,
            path: Vec::new(),
            visits: BTreeMap::new(),
        }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    /// Forget the previous run.
    pub fn reset(&mut self) {
        self.path.clear();
        self.visits.clear();
    }

    /// Try to descend into `type_name` where no field leads to it, as for
    /// the run root or the elements of a root collection.
    pub fn enter_type(&mut self, type_name: &str) -> bool {
        let occurrences = self.path.iter().filter(|name| *name == type_name).count();
        if occurrences > self.level {
            return false;
        }
        self.path.push(type_name.to_string());
        true
    }

    /// Try to descend into `type_name` through `key`.
    ///
    /// Every successful call must be paired with [`RecursionGuard::exit`].
    pub fn enter(&mut self, key: &FieldKey, type_name: &str) -> bool {
        if !self.enter_type(type_name) {
            return false;
        }
        *self.visits.entry(key.clone()).or_insert(0) += 1;
        true
    }

    /// Leave the composite entered last.
    pub fn exit(&mut self) {
        self.path.pop();
    }

    /// Times `key` was entered during the current run.
    pub fn visits(&self, key: &FieldKey) -> u64 {
        self.visits.get(key).copied().unwrap_or(0)
    }

    /// Entry counts of every field entered during the current run.
    pub fn entries(&self) -> impl Iterator<Item = (&FieldKey, u64)> {
        self.visits.iter().map(|(key, count)| (key, *count))
    }

    /// Composite types currently under construction, root included.
    pub fn depth(&self) -> usize {
        self.path.len()
    }
}
