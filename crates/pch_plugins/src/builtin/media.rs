use crate::converter::{Converter, ensure_input};
use crate::shim::ShimResolver;
use async_trait::async_trait;
use pch_domain::{
    CapabilitySet, ConstructArgs, ConstructError, ConvertError, ConverterResult, DataKind,
};
use std::path::PathBuf;

type Built = Result<Box<dyn Converter>, ConstructError>;

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders the prompt as an SVG image document.
pub struct TextToSvgConverter;

#[async_trait]
impl Converter for TextToSvgConverter {
    fn name(&self) -> &str {
        "TextToSvgConverter"
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::new([DataKind::Text], [DataKind::Image])
    }

    async fn convert_async(
        &self,
        prompt: &str,
        input_kind: DataKind,
    ) -> Result<ConverterResult, ConvertError> {
        ensure_input(&self.capabilities(), input_kind)?;
        let width = 16 + prompt.chars().count() * 10;
        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="40"><text x="8" y="26" font-family="monospace" font-size="16">{}</text></svg>"#,
            escape_xml(prompt)
        );
        Ok(ConverterResult::new(svg, DataKind::Image))
    }
}

pub(super) fn text_to_svg(args: &ConstructArgs, _shim: &dyn ShimResolver) -> Built {
    args.expect_only("TextToSvgConverter", &[])?;
    Ok(Box::new(TextToSvgConverter))
}

/// Overlays the prompt onto an existing image file.
pub struct AddTextImageConverter {
    image: PathBuf,
}

#[async_trait]
impl Converter for AddTextImageConverter {
    fn name(&self) -> &str {
        "AddTextImageConverter"
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::new([DataKind::Text], [DataKind::Image])
    }

    async fn convert_async(
        &self,
        _prompt: &str,
        input_kind: DataKind,
    ) -> Result<ConverterResult, ConvertError> {
        ensure_input(&self.capabilities(), input_kind)?;
        Err(ConvertError::BackendUnavailable(format!(
            "image rendering backend not available for {}",
            self.image.display()
        )))
    }
}

pub(super) fn add_text_image(args: &ConstructArgs, _shim: &dyn ShimResolver) -> Built {
    const NAME: &str = "AddTextImageConverter";
    args.expect_only(NAME, &["img_to_add", "text_to_add"])?;
    args.require(NAME, "img_to_add")?;

    let image = args.get_str("img_to_add")?.unwrap_or_default();
    if image.is_empty() || !std::path::Path::new(image).is_file() {
        return Err(ConstructError::ValidationFailed(
            "img_to_add must be a valid image path".to_string(),
        ));
    }
    Ok(Box::new(AddTextImageConverter {
        image: PathBuf::from(image),
    }))
}

/// Speech synthesis front end. Construction works offline; conversion needs
/// a speech backend this harness never has.
pub struct TextToAudioConverter {
    language: String,
    output_format: String,
}

#[async_trait]
impl Converter for TextToAudioConverter {
    fn name(&self) -> &str {
        "TextToAudioConverter"
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::new([DataKind::Text], [DataKind::Audio])
    }

    async fn convert_async(
        &self,
        _prompt: &str,
        input_kind: DataKind,
    ) -> Result<ConverterResult, ConvertError> {
        ensure_input(&self.capabilities(), input_kind)?;
        Err(ConvertError::BackendUnavailable(format!(
            "speech synthesis ({}, {}) is not configured",
            self.language, self.output_format
        )))
    }
}

pub(super) fn text_to_audio(args: &ConstructArgs, _shim: &dyn ShimResolver) -> Built {
    args.expect_only("TextToAudioConverter", &["synthesis_language", "output_format"])?;
    let output_format = args.get_str("output_format")?.unwrap_or("wav");
    if !matches!(output_format, "wav" | "mp3") {
        return Err(ConstructError::ValidationFailed(format!(
            "output_format '{}' is not valid (wav or mp3)",
            output_format
        )));
    }
    Ok(Box::new(TextToAudioConverter {
        language: args.get_str("synthesis_language")?.unwrap_or("en-US").to_string(),
        output_format: output_format.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shim::DefaultShim;

    #[tokio::test]
    async fn test_svg_output_is_image() {
        let converter = text_to_svg(&ConstructArgs::new(), &DefaultShim::default()).unwrap();
        assert!(!converter.capabilities().is_text_to_text());
        let out = converter.convert_async("a<b", DataKind::Text).await.unwrap();
        assert_eq!(out.output_kind, DataKind::Image);
        assert!(out.output_text.contains("a&lt;b"));
    }

    #[test]
    fn test_add_text_image_needs_real_file() {
        let shim = DefaultShim::default();
        let err = add_text_image(&ConstructArgs::new(), &shim).err().unwrap();
        assert!(matches!(err, ConstructError::ShapeMismatch(_)));

        let err = add_text_image(&ConstructArgs::new().with("img_to_add", ""), &shim)
            .err()
            .unwrap();
        assert!(matches!(err, ConstructError::ValidationFailed(_)));

        let file = tempfile::NamedTempFile::new().unwrap();
        let args = ConstructArgs::new().with("img_to_add", file.path().to_string_lossy().to_string());
        assert!(add_text_image(&args, &shim).is_ok());
    }

    #[tokio::test]
    async fn test_audio_constructs_but_cannot_convert() {
        let converter = text_to_audio(&ConstructArgs::new(), &DefaultShim::default()).unwrap();
        let err = converter.convert_async("test", DataKind::Text).await.unwrap_err();
        assert_eq!(err.kind_name(), "BackendUnavailable");
    }
}
