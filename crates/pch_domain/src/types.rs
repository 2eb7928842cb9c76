use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of data a converter consumes or produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Text,
    Image,
    Audio,
    Video,
}

impl DataKind {
    pub const ALL: [DataKind; 4] = [Self::Text, Self::Image, Self::Audio, Self::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown data kind: {0}")]
pub struct UnknownDataKind(pub String);

impl FromStr for DataKind {
    type Err = UnknownDataKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "image" | "image_path" => Ok(Self::Image),
            "audio" | "audio_path" => Ok(Self::Audio),
            "video" | "video_path" => Ok(Self::Video),
            other => Err(UnknownDataKind(other.to_string())),
        }
    }
}

/// Declared input and output kinds of a converter instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    pub inputs: Vec<DataKind>,
    pub outputs: Vec<DataKind>,
}

impl CapabilitySet {
    pub fn new(inputs: impl Into<Vec<DataKind>>, outputs: impl Into<Vec<DataKind>>) -> Self {
        Self {
            inputs: inputs.into(),
            outputs: outputs.into(),
        }
    }

    pub fn text_to_text() -> Self {
        Self::new([DataKind::Text], [DataKind::Text])
    }

    pub fn supports_input(&self, kind: DataKind) -> bool {
        self.inputs.contains(&kind)
    }

    pub fn supports_output(&self, kind: DataKind) -> bool {
        self.outputs.contains(&kind)
    }

    /// Text in both sets. Only such converters are used by the processors.
    pub fn is_text_to_text(&self) -> bool {
        self.supports_input(DataKind::Text) && self.supports_output(DataKind::Text)
    }

    /// `text→image` style label from the first declared kinds.
    pub fn label(&self) -> String {
        let input = self.inputs.first().map(DataKind::as_str).unwrap_or("unknown");
        let output = self.outputs.first().map(DataKind::as_str).unwrap_or("unknown");
        format!("{}→{}", input, output)
    }
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self::text_to_text()
    }
}

/// Value returned by a converter's conversion entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterResult {
    pub output_text: String,
    pub output_kind: DataKind,
}

impl ConverterResult {
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            output_text: output.into(),
            output_kind: DataKind::Text,
        }
    }

    pub fn new(output: impl Into<String>, kind: DataKind) -> Self {
        Self {
            output_text: output.into(),
            output_kind: kind,
        }
    }
}

/// Where a discovered converter came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PluginSource {
    Builtin,
    Script(std::path::PathBuf),
    Wasm(std::path::PathBuf),
}

impl fmt::Display for PluginSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin => f.write_str("builtin"),
            Self::Script(p) => write!(f, "lua:{}", p.display()),
            Self::Wasm(p) => write!(f, "wasm:{}", p.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_kind_parse() {
        assert_eq!("TEXT".parse::<DataKind>().unwrap(), DataKind::Text);
        assert_eq!(" image_path ".parse::<DataKind>().unwrap(), DataKind::Image);
        assert!("hologram".parse::<DataKind>().is_err());
    }

    #[test]
    fn test_text_to_text_predicate() {
        assert!(CapabilitySet::text_to_text().is_text_to_text());

        let to_image = CapabilitySet::new([DataKind::Text], [DataKind::Image]);
        assert!(!to_image.is_text_to_text());
        assert_eq!(to_image.label(), "text→image");

        let mixed = CapabilitySet::new(
            [DataKind::Image, DataKind::Text],
            [DataKind::Audio, DataKind::Text],
        );
        assert!(mixed.is_text_to_text());
    }

    #[test]
    fn test_empty_capabilities_label() {
        let empty = CapabilitySet::new(Vec::new(), Vec::new());
        assert_eq!(empty.label(), "unknown→unknown");
        assert!(!empty.is_text_to_text());
    }

    #[test]
    fn test_data_kind_serialization() {
        let json = serde_json::to_string(&DataKind::Audio).unwrap();
        assert_eq!(json, "\"audio\"");
    }
}
