use pch_domain::ConstructArgs;
use pch_plugins::ConverterFactory;

/// Constructor argument sets tried against converters with no declared
/// defaults, simplest first. Order is part of the contract.
pub fn fallback_candidates() -> Vec<ConstructArgs> {
    vec![
        ConstructArgs::new(),
        ConstructArgs::new().with("append_description", false),
        ConstructArgs::new().with("caesar_offset", 13),
        ConstructArgs::new()
            .with("caesar_offset", 13)
            .with("append_description", false),
        ConstructArgs::new().with("font", "block"),
        ConstructArgs::new().with("font", "rand"),
        ConstructArgs::new().with("encoding_func", "b64encode"),
        ConstructArgs::new().with("encoding_name", "cipher"),
        ConstructArgs::new().with("bits_per_char", 8),
        ConstructArgs::new().with("shift_value", 0),
        ConstructArgs::new().with_null("template"),
        ConstructArgs::new().with("output_format", "wav"),
        ConstructArgs::new().with("synthesis_language", "en-US"),
        ConstructArgs::new().with("recognition_language", "en-US"),
        ConstructArgs::new().with("img_to_add", ""),
        ConstructArgs::new().with("video_path", ""),
        ConstructArgs::new().with("text_to_add", "test"),
        ConstructArgs::new().with_null("word_selection_strategy"),
        ConstructArgs::new().with("word_split_separator", " "),
        ConstructArgs::new().with_null("converter_target"),
        ConstructArgs::new().with_null("prompt_target"),
    ]
}

/// The factory's own default configuration first, then `fallback` without
/// the entry it duplicates.
pub fn candidates_for(factory: &dyn ConverterFactory, fallback: &[ConstructArgs]) -> Vec<ConstructArgs> {
    match factory.default_args() {
        Some(defaults) => std::iter::once(defaults.clone())
            .chain(fallback.iter().filter(|c| **c != defaults).cloned())
            .collect(),
        None => fallback.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pch_domain::ArgValue;
    use pch_plugins::{ConverterFamily, FnFactory};

    fn never(
        _: &ConstructArgs,
        _: &dyn pch_plugins::ShimResolver,
    ) -> Result<Box<dyn pch_plugins::Converter>, pch_domain::ConstructError> {
        Err(pch_domain::ConstructError::Fatal("unused".into()))
    }

    #[test]
    fn test_fallback_order() {
        let list = fallback_candidates();
        assert_eq!(list.len(), 21);
        assert!(list[0].is_empty());
        assert_eq!(list[2].get("caesar_offset"), Some(&ArgValue::Int(13)));
        assert_eq!(list[3].len(), 2);
        assert_eq!(list[20].get("prompt_target"), Some(&ArgValue::Null));
    }

    #[test]
    fn test_defaults_go_first_without_duplicates() {
        let fallback = fallback_candidates();
        let plain = FnFactory::new("PlainConverter", ConverterFamily::Basic, never);
        assert_eq!(candidates_for(&plain, &fallback), fallback);

        let typed = FnFactory::new("TypedConverter", ConverterFamily::Cipher, never)
            .with_defaults(ConstructArgs::new().with("caesar_offset", 13));
        let list = candidates_for(&typed, &fallback);
        assert_eq!(list.len(), fallback.len());
        assert_eq!(list[0], ConstructArgs::new().with("caesar_offset", 13));
        assert!(list[1].is_empty());
    }
}
