use std::path::Path;

use fake::Fake;
use fake::faker::lorem::en::Word;
use rand::Rng;
use rand_regex::Regex as RandRegex;

use crate::assets::LineCache;
use crate::errors::{GenerationError, Result};
use crate::generators::{GeneratorPlugin, PluginRegistry, PluginRng, pattern_or};

pub const ALPHANUMERIC: &str = "ALPHANUMERIC";
pub const WORD: &str = "WORD";
pub const CUSTOM_LIST: &str = "CUSTOM_LIST";
pub const FILE2LIST: &str = "FILE2LIST";

const DEFAULT_TEXT_PATTERN: &str = "[A-Za-z0-9]{8}";
const DEFAULT_MAX_REPEAT: u32 = 32;

/// Register the text plugins.
pub fn register(registry: &mut PluginRegistry, seed: Option<u64>) {
    registry.register(
        ALPHANUMERIC,
        AlphanumericPlugin {
            rng: PluginRng::new(ALPHANUMERIC, seed),
        },
    );
    registry.register(
        WORD,
        WordPlugin {
            rng: PluginRng::new(WORD, seed),
        },
    );
    registry.register(
        CUSTOM_LIST,
        CustomListPlugin {
            rng: PluginRng::new(CUSTOM_LIST, seed),
        },
    );
    registry.register(
        FILE2LIST,
        FileListPlugin {
            lines: LineCache::new(),
        },
    );
}

/// Text matching a regular expression.
struct AlphanumericPlugin {
    rng: PluginRng,
}

impl GeneratorPlugin for AlphanumericPlugin {
    fn generate(&self, pattern: &str, _seed: &str) -> Result<String> {
        let pattern = pattern_or(pattern, DEFAULT_TEXT_PATTERN);
        let regex = RandRegex::compile(pattern, DEFAULT_MAX_REPEAT).map_err(|err| {
            GenerationError::plugin(
                ALPHANUMERIC,
                format!("invalid regex pattern '{pattern}': {err}"),
            )
        })?;
        self.rng.with(|rng| rng.sample::<String, _>(&regex))
    }
}

/// Lorem words; the pattern is the word count.
struct WordPlugin {
    rng: PluginRng,
}

impl GeneratorPlugin for WordPlugin {
    fn generate(&self, pattern: &str, _seed: &str) -> Result<String> {
        let count: usize = pattern_or(pattern, "1").parse().map_err(|_| {
            GenerationError::plugin(WORD, format!("word count '{pattern}' is not a number"))
        })?;
        self.rng.with(|rng| {
            (0..count)
                .map(|_| Word().fake_with_rng::<String, _>(rng))
                .collect::<Vec<_>>()
                .join(" ")
        })
    }
}

/// One entry of a comma separated list.
struct CustomListPlugin {
    rng: PluginRng,
}

impl GeneratorPlugin for CustomListPlugin {
    fn generate(&self, pattern: &str, _seed: &str) -> Result<String> {
        let candidates: Vec<&str> = pattern
            .split(',')
            .map(str::trim)
            .filter(|candidate| !candidate.is_empty())
            .collect();
        if candidates.is_empty() {
            return Err(GenerationError::plugin(
                CUSTOM_LIST,
                "pattern lists no candidates",
            ));
        }
        let index = self.rng.with(|rng| rng.random_range(0..candidates.len()))?;
        Ok(candidates[index].to_string())
    }
}

/// Lines of a text file, in order, starting over after the last one.
struct FileListPlugin {
    lines: LineCache,
}

impl GeneratorPlugin for FileListPlugin {
    fn generate(&self, pattern: &str, _seed: &str) -> Result<String> {
        let path = pattern.trim();
        if path.is_empty() {
            return Err(GenerationError::plugin(FILE2LIST, "pattern names no file"));
        }
        self.lines
            .next_line(Path::new(path))
            .map_err(|err| GenerationError::plugin(FILE2LIST, err.to_string()))
    }
}
