//! Built-in converters.
//!
//! A small demonstration set spanning the construction patterns the prober
//! has to cope with: no arguments, optional flags, a required cipher offset,
//! an encoding selector, a bit width, word-selection options, language-model
//! converters that cannot be built without a chat target, a human-in-the-loop
//! converter, and non-text outputs.

mod basic;
mod cipher;
mod encoding;
mod interactive;
mod llm;
mod media;
mod word_level;

pub use basic::TextFnConverter;
pub use cipher::{AtbashConverter, CaesarConverter};
pub use encoding::{Base64Converter, BinaryConverter};
pub use interactive::HumanInTheLoopConverter;
pub use llm::LlmRewriteConverter;
pub use media::{AddTextImageConverter, TextToAudioConverter, TextToSvgConverter};
pub use word_level::WordReverseConverter;

use crate::factory::{ConverterFactory, ConverterFamily, FnFactory};
use std::sync::Arc;

/// Every built-in factory, in registration order.
pub fn builtin_factories() -> Vec<Arc<dyn ConverterFactory>> {
    use ConverterFamily::*;

    let factories = vec![
        FnFactory::new("UpperCaseConverter", Basic, basic::upper_case),
        FnFactory::new("LowerCaseConverter", Basic, basic::lower_case),
        FnFactory::new("FlipConverter", Basic, basic::flip),
        FnFactory::new("CharacterSpaceConverter", Basic, basic::character_space),
        FnFactory::new("LeetspeakConverter", Basic, basic::leetspeak),
        FnFactory::new("ZeroWidthConverter", Basic, basic::zero_width),
        FnFactory::new("ROT13Converter", Cipher, cipher::rot13),
        FnFactory::new("CaesarConverter", Cipher, cipher::caesar),
        FnFactory::new("AtbashConverter", Cipher, cipher::atbash),
        FnFactory::new("Base64Converter", Encoding, encoding::base64),
        FnFactory::new("BinaryConverter", Encoding, encoding::binary),
        FnFactory::new("UrlConverter", Encoding, encoding::url),
        FnFactory::new("WordReverseConverter", WordLevel, word_level::word_reverse),
        FnFactory::new("ToneConverter", LanguageModel, llm::tone),
        FnFactory::new("TenseConverter", LanguageModel, llm::tense),
        FnFactory::new("HumanInTheLoopConverter", Interactive, interactive::human_in_the_loop),
        FnFactory::new("TextToSvgConverter", Media, media::text_to_svg),
        FnFactory::new("AddTextImageConverter", Media, media::add_text_image),
        FnFactory::new("TextToAudioConverter", Media, media::text_to_audio),
    ];

    factories
        .into_iter()
        .map(|f| Arc::new(f) as Arc<dyn ConverterFactory>)
        .collect()
}
