use crate::converter::{Converter, ensure_input};
use crate::shim::{ShimResolver, WordSelectionStrategy};
use async_trait::async_trait;
use pch_domain::{
    CapabilitySet, ConstructArgs, ConstructError, ConvertError, ConverterResult, DataKind,
};
use rand::Rng;

type Built = Result<Box<dyn Converter>, ConstructError>;

/// Reverses the letters of selected words.
pub struct WordReverseConverter {
    strategy: WordSelectionStrategy,
    separator: String,
}

impl WordReverseConverter {
    fn selected(&self, count: usize) -> Vec<bool> {
        let mut picks = vec![false; count];
        if count == 0 {
            return picks;
        }
        match self.strategy {
            WordSelectionStrategy::All => picks.iter_mut().for_each(|p| *p = true),
            WordSelectionStrategy::First => picks[0] = true,
            WordSelectionStrategy::Last => picks[count - 1] = true,
            WordSelectionStrategy::Random => {
                let i = rand::thread_rng().gen_range(0..count);
                picks[i] = true;
            }
        }
        picks
    }
}

#[async_trait]
impl Converter for WordReverseConverter {
    fn name(&self) -> &str {
        "WordReverseConverter"
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
        let words: Vec<&str> = prompt.split(self.separator.as_str()).collect();
        let picks = self.selected(words.len());
        let out: Vec<String> = words
            .iter()
            .zip(picks)
            .map(|(w, pick)| {
                if pick {
                    w.chars().rev().collect()
                } else {
                    (*w).to_string()
                }
            })
            .collect();
        Ok(ConverterResult::text(out.join(&self.separator)))
    }
}

pub(super) fn word_reverse(args: &ConstructArgs, _shim: &dyn ShimResolver) -> Built {
    args.expect_only(
        "WordReverseConverter",
        &["word_selection_strategy", "word_split_separator"],
    )?;

    let strategy = match args.get_str("word_selection_strategy")? {
        None => WordSelectionStrategy::default(),
        Some(name) => WordSelectionStrategy::parse(name).ok_or_else(|| {
            ConstructError::ValidationFailed(format!("'{}' is not a valid word selection strategy", name))
        })?,
    };

    let separator = args.get_str("word_split_separator")?.unwrap_or(" ");
    if separator.is_empty() {
        return Err(ConstructError::ValidationFailed(
            "word_split_separator cannot be empty".to_string(),
        ));
    }

    Ok(Box::new(WordReverseConverter {
        strategy,
        separator: separator.to_string(),
    }))
}
