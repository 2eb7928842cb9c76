use crate::converter::{Converter, ensure_input};
use crate::shim::ShimResolver;
use async_trait::async_trait;
use pch_domain::{
    CapabilitySet, ConstructArgs, ConstructError, ConvertError, ConverterResult, DataKind,
};

type Built = Result<Box<dyn Converter>, ConstructError>;

/// Text-to-text converter wrapping a plain function.
pub struct TextFnConverter {
    name: &'static str,
    transform: fn(&str) -> String,
}

impl TextFnConverter {
    pub fn new(name: &'static str, transform: fn(&str) -> String) -> Self {
        Self { name, transform }
    }
}

#[async_trait]
impl Converter for TextFnConverter {
    fn name(&self) -> &str {
        self.name
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::text_to_text()
    }

    async fn convert_async(
        &self,
        prompt: &str,
        input_kind: DataKind,
    ) -> Result<ConverterResult, ConvertError> {
        self.convert(prompt, input_kind)
    }

    fn convert(&self, prompt: &str, input_kind: DataKind) -> Result<ConverterResult, ConvertError> {
        ensure_input(&self.capabilities(), input_kind)?;
        Ok(ConverterResult::text((self.transform)(prompt)))
    }
}

fn no_args(name: &'static str, args: &ConstructArgs, transform: fn(&str) -> String) -> Built {
    args.expect_only(name, &[])?;
    Ok(Box::new(TextFnConverter::new(name, transform)))
}

pub(super) fn upper_case(args: &ConstructArgs, _shim: &dyn ShimResolver) -> Built {
    no_args("UpperCaseConverter", args, str::to_uppercase)
}

pub(super) fn lower_case(args: &ConstructArgs, _shim: &dyn ShimResolver) -> Built {
    no_args("LowerCaseConverter", args, str::to_lowercase)
}

pub(super) fn flip(args: &ConstructArgs, _shim: &dyn ShimResolver) -> Built {
    no_args("FlipConverter", args, |text| text.chars().rev().collect())
}

pub(super) fn character_space(args: &ConstructArgs, _shim: &dyn ShimResolver) -> Built {
    no_args("CharacterSpaceConverter", args, |text| {
        text.chars()
            .map(String::from)
            .collect::<Vec<_>>()
            .join(" ")
    })
}

pub(super) fn leetspeak(args: &ConstructArgs, _shim: &dyn ShimResolver) -> Built {
    no_args("LeetspeakConverter", args, |text| {
        text.chars()
            .map(|c| match c.to_ascii_lowercase() {
                'a' => '4',
                'e' => '3',
                'i' => '1',
                'o' => '0',
                's' => '5',
                't' => '7',
                _ => c,
            })
            .collect()
    })
}

pub(super) fn zero_width(args: &ConstructArgs, _shim: &dyn ShimResolver) -> Built {
    no_args("ZeroWidthConverter", args, |text| {
        let mut out = String::with_capacity(text.len() * 4);
        for (i, c) in text.chars().enumerate() {
            if i > 0 {
                out.push('\u{200B}');
            }
            out.push(c);
        }
        out
    })
}
