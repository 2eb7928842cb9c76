use crate::converter::Converter;
use crate::shim::ShimResolver;
use pch_domain::{ConstructArgs, ConstructError};
use std::fmt;

/// Configuration family a converter belongs to. Decides which typed
/// defaults are worth trying before the generic candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConverterFamily {
    Basic,
    Cipher,
    Encoding,
    WordLevel,
    LanguageModel,
    Interactive,
    Media,
    /// Untyped scripts and modules loaded from a plugin directory.
    Legacy,
}

impl fmt::Display for ConverterFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Basic => "basic",
            Self::Cipher => "cipher",
            Self::Encoding => "encoding",
            Self::WordLevel => "word-level",
            Self::LanguageModel => "language-model",
            Self::Interactive => "interactive",
            Self::Media => "media",
            Self::Legacy => "legacy",
        };
        f.write_str(s)
    }
}

/// Builds converter instances from keyword arguments.
pub trait ConverterFactory: Send + Sync {
    fn name(&self) -> &str;

    fn family(&self) -> ConverterFamily {
        ConverterFamily::Legacy
    }

    /// Explicit typed default configuration, tried before any fallback candidate.
    fn default_args(&self) -> Option<ConstructArgs> {
        None
    }

    fn construct(
        &self,
        args: &ConstructArgs,
        shim: &dyn ShimResolver,
    ) -> Result<Box<dyn Converter>, ConstructError>;
}

pub type ConstructFn =
    fn(&ConstructArgs, &dyn ShimResolver) -> Result<Box<dyn Converter>, ConstructError>;

/// Factory backed by a plain constructor function. Used for the built-in list.
pub struct FnFactory {
    name: &'static str,
    family: ConverterFamily,
    defaults: Option<ConstructArgs>,
    construct: ConstructFn,
}

impl FnFactory {
    pub fn new(name: &'static str, family: ConverterFamily, construct: ConstructFn) -> Self {
        Self {
            name,
            family,
            defaults: None,
            construct,
        }
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: ConstructArgs) -> Self {
        self.defaults = Some(defaults);
        self
    }
}

impl ConverterFactory for FnFactory {
    fn name(&self) -> &str {
        self.name
    }

    fn family(&self) -> ConverterFamily {
        self.family
    }

    fn default_args(&self) -> Option<ConstructArgs> {
        self.defaults.clone()
    }

    fn construct(
        &self,
        args: &ConstructArgs,
        shim: &dyn ShimResolver,
    ) -> Result<Box<dyn Converter>, ConstructError> {
        (self.construct)(args, shim)
    }
}

impl fmt::Debug for dyn ConverterFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterFactory")
            .field("name", &self.name())
            .field("family", &self.family())
            .finish()
    }
}
