use crate::converter::{Converter, ensure_input};
use crate::shim::ShimResolver;
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use pch_domain::{
    CapabilitySet, ConstructArgs, ConstructError, ConvertError, ConverterResult, DataKind,
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use super::basic::TextFnConverter;

type Built = Result<Box<dyn Converter>, ConstructError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Base64Flavor {
    Standard,
    UrlSafe,
}

pub struct Base64Converter {
    flavor: Base64Flavor,
}

#[async_trait]
impl Converter for Base64Converter {
    fn name(&self) -> &str {
        "Base64Converter"
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
        let encoded = match self.flavor {
            Base64Flavor::Standard => STANDARD.encode(prompt),
            Base64Flavor::UrlSafe => URL_SAFE.encode(prompt),
        };
        Ok(ConverterResult::text(encoded))
    }
}

pub(super) fn base64(args: &ConstructArgs, _shim: &dyn ShimResolver) -> Built {
    args.expect_only("Base64Converter", &["encoding_func"])?;
    let flavor = match args.get_str("encoding_func")? {
        None | Some("b64encode") | Some("standard_b64encode") => Base64Flavor::Standard,
        Some("urlsafe_b64encode") => Base64Flavor::UrlSafe,
        Some(other) => {
            return Err(ConstructError::ValidationFailed(format!(
                "encoding_func '{}' is not a valid base64 function",
                other
            )));
        }
    };
    Ok(Box::new(Base64Converter { flavor }))
}

/// Writes each character's code point as a fixed-width binary group.
pub struct BinaryConverter {
    bits_per_char: u32,
}

#[async_trait]
impl Converter for BinaryConverter {
    fn name(&self) -> &str {
        "BinaryConverter"
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
        let width = self.bits_per_char as usize;
        let mut groups = Vec::with_capacity(prompt.len());
        for c in prompt.chars() {
            let code = c as u32;
            if self.bits_per_char < 32 && code >> self.bits_per_char != 0 {
                return Err(ConvertError::Execution(format!(
                    "character '{}' does not fit in {} bits",
                    c, self.bits_per_char
                )));
            }
            groups.push(format!("{:0width$b}", code, width = width));
        }
        Ok(ConverterResult::text(groups.join(" ")))
    }
}

pub(super) fn binary(args: &ConstructArgs, _shim: &dyn ShimResolver) -> Built {
    args.expect_only("BinaryConverter", &["bits_per_char"])?;
    let bits_per_char = match args.get_int("bits_per_char")? {
        None => 16,
        Some(bits @ (8 | 16 | 32)) => bits as u32,
        Some(other) => {
            return Err(ConstructError::ValidationFailed(format!(
                "bits_per_char must be 8, 16 or 32, not {}",
                other
            )));
        }
    };
    Ok(Box::new(BinaryConverter { bits_per_char }))
}

pub(super) fn url(args: &ConstructArgs, _shim: &dyn ShimResolver) -> Built {
    args.expect_only("UrlConverter", &[])?;
    Ok(Box::new(TextFnConverter::new("UrlConverter", |text| {
        utf8_percent_encode(text, NON_ALPHANUMERIC).to_string()
    })))
}
