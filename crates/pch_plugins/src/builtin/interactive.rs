use crate::converter::{Converter, ensure_input};
use crate::shim::ShimResolver;
use async_trait::async_trait;
use dialoguer::Input;
use pch_domain::{
    CapabilitySet, ConstructArgs, ConstructError, ConvertError, ConverterResult, DataKind,
};
use std::io::IsTerminal;

/// Lets an operator edit each prompt on the terminal.
pub struct HumanInTheLoopConverter;

#[async_trait]
impl Converter for HumanInTheLoopConverter {
    fn name(&self) -> &str {
        "HumanInTheLoopConverter"
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::text_to_text()
    }

    async fn convert_async(
        &self,
        prompt: &str,
        input_kind: DataKind,
    ) -> Result<ConverterResult, ConvertError> {
        ensure_input(&self.capabilities(), input_kind)?;
        if !std::io::stdin().is_terminal() {
            return Err(ConvertError::Interactive("no terminal attached".to_string()));
        }

        let initial = prompt.to_string();
        let edited = tokio::task::spawn_blocking(move || {
            Input::<String>::new()
                .with_prompt("Edit prompt")
                .with_initial_text(initial)
                .allow_empty(true)
                .interact_text()
        })
        .await
        .map_err(|e| ConvertError::Panicked(e.to_string()))?
        .map_err(|e| ConvertError::Interactive(e.to_string()))?;

        Ok(ConverterResult::text(edited))
    }

    fn requires_human_input(&self) -> bool {
        true
    }
}

pub(super) fn human_in_the_loop(
    args: &ConstructArgs,
    _shim: &dyn ShimResolver,
) -> Result<Box<dyn Converter>, ConstructError> {
    args.expect_only("HumanInTheLoopConverter", &[])?;
    Ok(Box::new(HumanInTheLoopConverter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shim::DefaultShim;

    #[test]
    fn test_flags_human_input() {
        let converter = human_in_the_loop(&ConstructArgs::new(), &DefaultShim::default()).unwrap();
        assert!(converter.requires_human_input());
        assert!(converter.capabilities().is_text_to_text());
    }
}
