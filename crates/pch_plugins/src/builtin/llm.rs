use crate::converter::{Converter, ensure_input};
use crate::shim::{ChatTarget, SeedTemplate, ShimResolver};
use async_trait::async_trait;
use pch_domain::{
    ArgValue, CapabilitySet, ConstructArgs, ConstructError, ConvertError, ConverterResult,
    DataKind,
};
use std::sync::Arc;

type Built = Result<Box<dyn Converter>, ConstructError>;

/// Asks a chat target to rewrite the prompt along one axis (tone, tense).
pub struct LlmRewriteConverter {
    name: &'static str,
    target: Arc<dyn ChatTarget>,
    system_prompt: String,
}

#[async_trait]
impl Converter for LlmRewriteConverter {
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
        ensure_input(&self.capabilities(), input_kind)?;
        let reply = self.target.send_prompt(&self.system_prompt, prompt).await?;
        Ok(ConverterResult::text(reply.trim()))
    }
}

/// Argument value from the call, else from the shim's defaults.
fn resolve_str(
    name: &str,
    key: &str,
    args: &ConstructArgs,
    shim: &dyn ShimResolver,
) -> Result<String, ConstructError> {
    if let Some(value) = args.get_str(key)? {
        return Ok(value.to_string());
    }
    match shim.default_value(key) {
        Some(ArgValue::Str(value)) => Ok(value),
        _ => Err(ConstructError::ShapeMismatch(format!(
            "{}() missing 1 required keyword-only argument: '{}'",
            name, key
        ))),
    }
}

fn build_rewrite(
    name: &'static str,
    axis: &str,
    args: &ConstructArgs,
    shim: &dyn ShimResolver,
) -> Built {
    args.expect_only(name, &[axis, "converter_target", "prompt_template"])?;
    let value = resolve_str(name, axis, args, shim)?;

    // A target cannot be passed as a plain argument value; only the shim provides one
    let target = shim.chat_target().ok_or_else(|| {
        ConstructError::ValidationFailed("converter_target is required".to_string())
    })?;

    let template = match args.get_str("prompt_template")? {
        Some(inline) => SeedTemplate::new(format!("{}_inline", axis), inline),
        None => shim.load_seed_template(
            &shim
                .seed_prompt_dir()
                .join("converters")
                .join(format!("{}_converter.yaml", axis)),
        ),
    };

    let system_prompt = if template.template.trim().is_empty() {
        format!(
            "Rewrite the user's prompt so that its {} is {}. Reply with the rewritten prompt only.",
            axis, value
        )
    } else {
        template.render(&[(axis, value.as_str())])
    };

    Ok(Box::new(LlmRewriteConverter {
        name,
        target,
        system_prompt,
    }))
}

pub(super) fn tone(args: &ConstructArgs, shim: &dyn ShimResolver) -> Built {
    build_rewrite("ToneConverter", "tone", args, shim)
}

pub(super) fn tense(args: &ConstructArgs, shim: &dyn ShimResolver) -> Built {
    build_rewrite("TenseConverter", "tense", args, shim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shim::DefaultShim;

    struct Echo;

    #[async_trait]
    impl ChatTarget for Echo {
        fn name(&self) -> &str {
            "Echo"
        }

        async fn send_prompt(&self, system_prompt: &str, prompt: &str) -> Result<String, ConvertError> {
            Ok(format!("[{system_prompt}] {prompt}"))
        }
    }

    #[test]
    fn test_tone_without_value_is_shape_mismatch() {
        let err = tone(&ConstructArgs::new(), &DefaultShim::default()).err().unwrap();
        assert!(matches!(err, ConstructError::ShapeMismatch(_)));
    }

    #[test]
    fn test_tone_without_target_fails_validation() {
        let shim = DefaultShim::default().with_default("tone", "angry");
        let err = tone(&ConstructArgs::new().with_null("converter_target"), &shim)
            .err()
            .unwrap();
        assert_eq!(
            err,
            ConstructError::ValidationFailed("converter_target is required".to_string())
        );
    }

    #[tokio::test]
    async fn test_tense_with_target_and_inline_template() {
        let shim = DefaultShim::default().with_chat_target(Arc::new(Echo));
        let args = ConstructArgs::new()
            .with("tense", "past")
            .with("prompt_template", "use the {{ tense }} tense");
        let converter = tense(&args, &shim).unwrap();
        let out = converter.convert_async("go home", DataKind::Text).await.unwrap();
        assert_eq!(out.output_text, "[use the past tense] go home");
    }

    #[tokio::test]
    async fn test_missing_template_file_uses_builtin_instruction() {
        let dir = tempfile::TempDir::new().unwrap();
        let shim = DefaultShim::new(dir.path())
            .with_chat_target(Arc::new(Echo))
            .with_default("tone", "polite");
        let converter = tone(&ConstructArgs::new(), &shim).unwrap();
        let out = converter.convert_async("hi", DataKind::Text).await.unwrap();
        assert!(out.output_text.contains("its tone is polite"));
    }
}
