//! Stand-ins for the framework types converters expect to find.
//!
//! Converters never reach for these globally; the harness hands a
//! [`ShimResolver`] to every factory call.

use async_trait::async_trait;
use pch_domain::{ArgValue, ConstructArgs, ConvertError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::debug;
use uuid::Uuid;

/// Identity record a converter can attach to its results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverterIdentifier {
    pub id: Uuid,
    pub type_name: String,
    pub params: ConstructArgs,
}

/// Seed prompt template: loaded by path, rendered with `{{ key }}` substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedTemplate {
    pub name: String,
    pub template: String,
}

impl SeedTemplate {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
        }
    }

    /// Read a template file. A missing file yields an empty template named
    /// after the file stem.
    pub fn from_file(path: &Path) -> Self {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();
        let template = std::fs::read_to_string(path).unwrap_or_default();
        Self { name, template }
    }

    /// Substitute `{{ key }}` placeholders. Unknown keys are left in place.
    /// An empty template renders to the `prompt` value.
    pub fn render(&self, params: &[(&str, &str)]) -> String {
        if self.template.trim().is_empty() {
            return params
                .iter()
                .find(|(k, _)| *k == "prompt")
                .map(|(_, v)| v.to_string())
                .unwrap_or_default();
        }

        static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
        let re = PLACEHOLDER.get_or_init(|| {
            Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder regex is valid")
        });

        re.replace_all(&self.template, |caps: &regex::Captures<'_>| {
            let key = &caps[1];
            params
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
    }
}

/// Chat-completion endpoint used by language-model converters.
#[async_trait]
pub trait ChatTarget: Send + Sync {
    fn name(&self) -> &str;

    async fn send_prompt(&self, system_prompt: &str, prompt: &str) -> Result<String, ConvertError>;
}

/// Target that accepts construction but has no backend behind it.
pub struct PlaceholderChatTarget;

#[async_trait]
impl ChatTarget for PlaceholderChatTarget {
    fn name(&self) -> &str {
        "PlaceholderChatTarget"
    }

    async fn send_prompt(&self, _system_prompt: &str, _prompt: &str) -> Result<String, ConvertError> {
        Err(ConvertError::BackendUnavailable(
            "no language-model backend is configured".to_string(),
        ))
    }
}

/// How word-level converters pick the words they touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordSelectionStrategy {
    #[default]
    All,
    First,
    Last,
    Random,
}

impl WordSelectionStrategy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "first" => Some(Self::First),
            "last" => Some(Self::Last),
            "random" => Some(Self::Random),
            _ => None,
        }
    }
}

/// Supplies the framework pieces converters rely on.
pub trait ShimResolver: Send + Sync {
    /// Build an identifier for a converter type and its construction params.
    fn identifier(&self, type_name: &str, params: &ConstructArgs) -> ConverterIdentifier {
        ConverterIdentifier {
            id: Uuid::new_v4(),
            type_name: type_name.to_string(),
            params: params.clone(),
        }
    }

    fn seed_prompt_dir(&self) -> &Path;

    fn db_data_dir(&self) -> &Path;

    fn datasets_dir(&self) -> &Path;

    fn load_seed_template(&self, path: &Path) -> SeedTemplate;

    /// Injected default for a `converter_target` argument. `None` means no
    /// language-model backend is available.
    fn chat_target(&self) -> Option<Arc<dyn ChatTarget>>;

    /// Injected default for an argument the caller did not supply.
    fn default_value(&self, key: &str) -> Option<ArgValue>;
}

/// Resolver backed by fixed paths and a table of argument defaults.
/// Seed templates are read once and cached for the life of the resolver.
pub struct DefaultShim {
    seed_prompt_dir: PathBuf,
    db_data_dir: PathBuf,
    datasets_dir: PathBuf,
    chat_target: Option<Arc<dyn ChatTarget>>,
    defaults: HashMap<String, ArgValue>,
    templates: Mutex<HashMap<PathBuf, SeedTemplate>>,
}

impl DefaultShim {
    /// Paths rooted at `base` (`seeds/`, `db_data/`, `datasets/`).
    pub fn new(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self {
            seed_prompt_dir: base.join("seeds"),
            db_data_dir: base.join("db_data"),
            datasets_dir: base.join("datasets"),
            chat_target: None,
            defaults: HashMap::new(),
            templates: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_chat_target(mut self, target: Arc<dyn ChatTarget>) -> Self {
        self.chat_target = Some(target);
        self
    }

    #[must_use]
    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }
}

impl Default for DefaultShim {
    fn default() -> Self {
        Self::new(".")
    }
}

impl ShimResolver for DefaultShim {
    fn seed_prompt_dir(&self) -> &Path {
        &self.seed_prompt_dir
    }

    fn db_data_dir(&self) -> &Path {
        &self.db_data_dir
    }

    fn datasets_dir(&self) -> &Path {
        &self.datasets_dir
    }

    fn load_seed_template(&self, path: &Path) -> SeedTemplate {
        let mut cache = match self.templates.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        cache
            .entry(path.to_path_buf())
            .or_insert_with(|| {
                debug!("Loading seed template {}", path.display());
                SeedTemplate::from_file(path)
            })
            .clone()
    }

    fn chat_target(&self) -> Option<Arc<dyn ChatTarget>> {
        self.chat_target.clone()
    }

    fn default_value(&self, key: &str) -> Option<ArgValue> {
        self.defaults.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_known_keys() {
        let t = SeedTemplate::new("tone", "Rewrite in a {{ tone }} tone: {{prompt}} {{ other }}");
        let out = t.render(&[("tone", "sarcastic"), ("prompt", "hello")]);
        assert_eq!(out, "Rewrite in a sarcastic tone: hello {{ other }}");
    }

    #[test]
    fn test_empty_template_renders_prompt() {
        let t = SeedTemplate::new("empty", "");
        assert_eq!(t.render(&[("prompt", "hello")]), "hello");
        assert_eq!(t.render(&[]), "");
    }

    #[test]
    fn test_missing_template_file_is_named_by_stem() {
        let t = SeedTemplate::from_file(Path::new("/nonexistent/tone_converter.yaml"));
        assert_eq!(t.name, "tone_converter");
        assert!(t.template.is_empty());
    }

    #[test]
    fn test_default_shim_paths_and_defaults() {
        let shim = DefaultShim::new("/opt/pch").with_default("tone", "angry");
        assert_eq!(shim.seed_prompt_dir(), Path::new("/opt/pch/seeds"));
        assert_eq!(shim.datasets_dir(), Path::new("/opt/pch/datasets"));
        assert_eq!(shim.default_value("tone"), Some(ArgValue::Str("angry".into())));
        assert_eq!(shim.default_value("tense"), None);
        assert!(shim.chat_target().is_none());
    }

    #[test]
    fn test_template_cache_reads_once() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("t.yaml");
        std::fs::write(&path, "first {{ prompt }}").unwrap();

        let shim = DefaultShim::new(dir.path());
        let first = shim.load_seed_template(&path);
        std::fs::write(&path, "second {{ prompt }}").unwrap();
        let second = shim.load_seed_template(&path);
        assert_eq!(first, second);
        assert_eq!(second.render(&[("prompt", "x")]), "first x");
    }

    #[test]
    fn test_identifier_carries_params() {
        let shim = DefaultShim::default();
        let params = ConstructArgs::new().with("caesar_offset", 13);
        let id = shim.identifier("CaesarConverter", &params);
        assert_eq!(id.type_name, "CaesarConverter");
        assert_eq!(id.params, params);
        assert_ne!(id.id, shim.identifier("CaesarConverter", &params).id);
    }

    #[tokio::test]
    async fn test_placeholder_target_has_no_backend() {
        let err = PlaceholderChatTarget.send_prompt("sys", "hi").await.unwrap_err();
        assert!(matches!(err, ConvertError::BackendUnavailable(_)));
    }

    #[test]
    fn test_word_selection_parse() {
        assert_eq!(WordSelectionStrategy::parse("LAST"), Some(WordSelectionStrategy::Last));
        assert_eq!(WordSelectionStrategy::parse("middle"), None);
    }
}
