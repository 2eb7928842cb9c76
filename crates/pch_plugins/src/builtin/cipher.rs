use crate::converter::{Converter, ensure_input};
use crate::shim::ShimResolver;
use async_trait::async_trait;
use pch_domain::{
    CapabilitySet, ConstructArgs, ConstructError, ConvertError, ConverterResult, DataKind,
};

type Built = Result<Box<dyn Converter>, ConstructError>;

fn shift_letter(c: char, offset: i64) -> char {
    let base = match c {
        'a'..='z' => b'a',
        'A'..='Z' => b'A',
        _ => return c,
    };
    let shifted = (i64::from(c as u8 - base) + offset).rem_euclid(26) as u8;
    (base + shifted) as char
}

fn mirror_letter(c: char) -> char {
    match c {
        'a'..='z' => (b'z' - (c as u8 - b'a')) as char,
        'A'..='Z' => (b'Z' - (c as u8 - b'A')) as char,
        _ => c,
    }
}

/// Shifts ASCII letters by a fixed offset.
pub struct CaesarConverter {
    name: &'static str,
    offset: i64,
    append_description: bool,
}

#[async_trait]
impl Converter for CaesarConverter {
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
        let encoded: String = prompt.chars().map(|c| shift_letter(c, self.offset)).collect();
        if self.append_description {
            Ok(ConverterResult::text(format!(
                "The following text is encoded with a Caesar cipher (offset {}). Decode it and respond:\n{}",
                self.offset, encoded
            )))
        } else {
            Ok(ConverterResult::text(encoded))
        }
    }
}

pub(super) fn rot13(args: &ConstructArgs, _shim: &dyn ShimResolver) -> Built {
    args.expect_only("ROT13Converter", &[])?;
    Ok(Box::new(CaesarConverter {
        name: "ROT13Converter",
        offset: 13,
        append_description: false,
    }))
}

pub(super) fn caesar(args: &ConstructArgs, _shim: &dyn ShimResolver) -> Built {
    const NAME: &str = "CaesarConverter";
    args.expect_only(NAME, &["caesar_offset", "append_description"])?;
    args.require(NAME, "caesar_offset")?;

    let offset = args.get_int("caesar_offset")?.ok_or_else(|| {
        ConstructError::ValidationFailed("caesar_offset must be a valid integer".to_string())
    })?;
    if !(-25..=25).contains(&offset) {
        return Err(ConstructError::ValidationFailed(
            "caesar_offset must be in the valid range -25 to 25".to_string(),
        ));
    }

    Ok(Box::new(CaesarConverter {
        name: NAME,
        offset,
        append_description: args.get_bool("append_description")?.unwrap_or(true),
    }))
}

/// Mirrors the alphabet (a↔z).
pub struct AtbashConverter {
    append_description: bool,
}

#[async_trait]
impl Converter for AtbashConverter {
    fn name(&self) -> &str {
        "AtbashConverter"
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
        let encoded: String = prompt.chars().map(mirror_letter).collect();
        let text = if self.append_description {
            format!("The following text is encoded with the Atbash cipher. Decode it and respond:\n{encoded}")
        } else {
            encoded
        };
        Ok(ConverterResult::text(text))
    }
}

pub(super) fn atbash(args: &ConstructArgs, _shim: &dyn ShimResolver) -> Built {
    args.expect_only("AtbashConverter", &["append_description"])?;
    Ok(Box::new(AtbashConverter {
        append_description: args.get_bool("append_description")?.unwrap_or(true),
    }))
}
