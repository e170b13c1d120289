//! Generator plugins: the registry, the plugin contract and the built-ins.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::errors::{GenerationError, Result};

pub mod primitives;
pub mod semantic;
pub mod text;

pub use primitives::{DATE, NUMBER};
pub use semantic::{ADDRESS, HUMAN_NAMES};
pub use text::{ALPHANUMERIC, CUSTOM_LIST, FILE2LIST, WORD};

/// Text producer bound to directives by name.
///
/// `pattern` shapes the output; `seed` is the directive's literal value and is
/// free for the plugin to interpret. Plugins keeping a cursor must guard it
/// themselves since they are shared behind `&self`.
pub trait GeneratorPlugin: Send + Sync {
    fn generate(&self, pattern: &str, seed: &str) -> Result<String>;
}

impl<F> GeneratorPlugin for F
where
    F: Fn(&str, &str) -> Result<String> + Send + Sync,
{
    fn generate(&self, pattern: &str, seed: &str) -> Result<String> {
        self(pattern, seed)
    }
}

/// Name -> plugin table consulted by the engine and by placeholder decoding.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: BTreeMap<String, Box<dyn GeneratorPlugin>>,
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}

impl PluginRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in plugin, seeded from `seed` when set.
    pub fn with_defaults(seed: Option<u64>) -> Self {
        let mut registry = Self::new();
        text::register(&mut registry, seed);
        semantic::register(&mut registry, seed);
        primitives::register(&mut registry, seed);
        registry
    }

    /// Store `plugin` under `name`, replacing any previous registration.
    pub fn register(&mut self, name: impl Into<String>, plugin: impl GeneratorPlugin + 'static) {
        self.plugins.insert(name.into(), Box::new(plugin));
    }

    /// Plugin registered as `name`.
    pub fn get(&self, name: &str) -> Option<&dyn GeneratorPlugin> {
        self.plugins.get(name).map(|plugin| plugin.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.plugins.keys().map(String::as_str).collect()
    }

    /// Run the plugin registered as `name`.
    pub fn invoke(&self, name: &str, pattern: &str, seed: &str) -> Result<String> {
        let plugin = self
            .get(name)
            .ok_or_else(|| GenerationError::GeneratorNotFound(name.to_string()))?;
        plugin.generate(pattern, seed)
    }
}

/// Random source owned by one plugin.
pub(crate) struct PluginRng {
    name: &'static str,
    rng: Mutex<ChaCha8Rng>,
}

impl PluginRng {
    pub(crate) fn new(name: &'static str, seed: Option<u64>) -> Self {
        let base = seed.unwrap_or_else(rand::random::<u64>);
        Self {
            name,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(hash_seed(base, name))),
        }
    }

    pub(crate) fn with<R>(&self, draw: impl FnOnce(&mut ChaCha8Rng) -> R) -> Result<R> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| GenerationError::plugin(self.name, "random source poisoned"))?;
        Ok(draw(&mut rng))
    }
}

fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Pattern with blank input replaced by `default`.
pub(crate) fn pattern_or<'a>(pattern: &'a str, default: &'a str) -> &'a str {
    let trimmed = pattern.trim();
    if trimmed.is_empty() { default } else { trimmed }
}
