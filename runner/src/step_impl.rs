//! The step implementation registry.
//!
//! Every registration is validated once, against its own pattern and
//! signature. Rejected registrations are returned to the caller and never
//! stored.

use regex::Regex;

use crate::context::{IntoOutcome, StepContext};
use crate::error::RegistrationError;
use crate::pattern::{compile_anchored, display_pattern};
use crate::transform::TransformRegistry;
use crate::value::{Arg, ParamType, StepArg, signature_string};

/// A type-erased step implementation. Arguments arrive in signature order,
/// without the context.
pub type Handler = Box<dyn Fn(&mut StepContext, Vec<Arg>) -> Result<(), String>>;

/// Functions usable as step implementations:
/// `Fn(&mut StepContext, A1, .., An) -> R` for up to eight arguments, where
/// every `Ai` is a [`StepArg`] and `R` is `()` or `Result<(), E>`.
pub trait StepFn<Args>: 'static {
    /// Parameter types, the context first.
    fn signature() -> Vec<ParamType>;
    fn into_handler(self) -> Handler;
}

macro_rules! impl_step_fn {
    ($($ty:ident),*) => {
        impl<F, R, $($ty,)*> StepFn<($($ty,)*)> for F
        where
            F: Fn(&mut StepContext, $($ty),*) -> R + 'static,
            R: IntoOutcome,
            $($ty: StepArg,)*
        {
            fn signature() -> Vec<ParamType> {
                vec![ParamType::Context, $(<$ty as StepArg>::param_type()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn into_handler(self) -> Handler {
                Box::new(move |ctx: &mut StepContext, args: Vec<Arg>| {
                    let mut args = args.into_iter();
                    $(
                        let $ty = args
                            .next()
                            .and_then(<$ty as StepArg>::from_arg)
                            .ok_or_else(|| {
                                format!("missing argument of type {}", std::any::type_name::<$ty>())
                            })?;
                    )*
                    (self)(ctx, $($ty),*).into_outcome()
                })
            }
        }
    };
}

impl_step_fn!();
impl_step_fn!(A1);
impl_step_fn!(A1, A2);
impl_step_fn!(A1, A2, A3);
impl_step_fn!(A1, A2, A3, A4);
impl_step_fn!(A1, A2, A3, A4, A5);
impl_step_fn!(A1, A2, A3, A4, A5, A6);
impl_step_fn!(A1, A2, A3, A4, A5, A6, A7);
impl_step_fn!(A1, A2, A3, A4, A5, A6, A7, A8);

pub struct StepImplementation {
    regex: Regex,
    signature: Vec<ParamType>,
    /// Parameters filled from capture groups, right after the context.
    captured: usize,
    handler: Handler,
}

impl StepImplementation {
    /// The pattern as registered, without anchors.
    pub fn pattern(&self) -> &str {
        display_pattern(&self.regex)
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn signature(&self) -> &[ParamType] {
        &self.signature
    }

    pub fn captured_params(&self) -> &[ParamType] {
        &self.signature[1..1 + self.captured]
    }

    /// The trailing `Table`/`TextBlock` parameters, in declared order.
    pub fn attachment_params(&self) -> &[ParamType] {
        &self.signature[1 + self.captured..]
    }

    pub fn table_count(&self) -> usize {
        self.count_attachments(&ParamType::Table)
    }

    pub fn text_block_count(&self) -> usize {
        self.count_attachments(&ParamType::TextBlock)
    }

    fn count_attachments(&self, kind: &ParamType) -> usize {
        self.attachment_params().iter().filter(|p| *p == kind).count()
    }

    /// `"pattern" => [fn(&mut StepContext, ..)]`, used in diagnostics.
    pub fn description(&self) -> String {
        format!("{:?} => [{}]", self.pattern(), signature_string(&self.signature))
    }

    pub fn call(&self, ctx: &mut StepContext, args: Vec<Arg>) -> Result<(), String> {
        (self.handler)(ctx, args)
    }
}

#[derive(Default)]
pub struct StepRegistry {
    steps: Vec<StepImplementation>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a typed closure or function for `pattern`.
    pub fn register<Args, F>(&mut self, pattern: &str, f: F) -> Result<(), RegistrationError>
    where
        F: StepFn<Args>,
    {
        self.register_dynamic(pattern, F::signature(), f.into_handler())
    }

    /// Register a handler with an explicit signature. The signature must
    /// start with [`ParamType::Context`], `Table`/`TextBlock` parameters must
    /// all trail the captured ones, and the captured parameters must equal
    /// the capture group count.
    pub fn register_dynamic(
        &mut self,
        pattern: &str,
        signature: Vec<ParamType>,
        handler: Handler,
    ) -> Result<(), RegistrationError> {
        let regex = compile_anchored(pattern).map_err(|e| RegistrationError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        if signature.first() != Some(&ParamType::Context) {
            return Err(RegistrationError::MissingContext {
                pattern: pattern.to_string(),
                signature: signature_string(&signature),
            });
        }

        let trailing = signature[1..]
            .iter()
            .rev()
            .take_while(|p| p.is_attachment())
            .count();
        let captured = signature.len() - 1 - trailing;
        if signature[1..1 + captured].iter().any(ParamType::is_attachment) {
            return Err(RegistrationError::MisplacedAttachment {
                pattern: pattern.to_string(),
                signature: signature_string(&signature),
            });
        }
        let captures = regex.captures_len() - 1;
        if captured != captures {
            return Err(RegistrationError::ParamCountMismatch {
                pattern: pattern.to_string(),
                signature: signature_string(&signature),
                captures,
                params: captured,
            });
        }

        tracing::debug!(pattern, signature = %signature_string(&signature), "registered step");
        self.steps.push(StepImplementation {
            regex,
            signature,
            captured,
            handler,
        });
        Ok(())
    }

    /// Captured parameter types no transform can produce. Such a step can
    /// never match, but its registration stands.
    pub fn check_transforms(&self, transforms: &TransformRegistry) -> Vec<RegistrationError> {
        let mut missing = Vec::new();
        for step in &self.steps {
            for param in step.captured_params() {
                if !transforms.has_transform(param) {
                    missing.push(RegistrationError::NoTransform {
                        pattern: step.pattern().to_string(),
                        param: param.to_string(),
                    });
                }
            }
        }
        missing
    }

    pub fn get(&self, index: usize) -> Option<&StepImplementation> {
        self.steps.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepImplementation> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// A batch of step registrations, applied to a registry later.
#[derive(Default)]
pub struct Steps {
    entries: Vec<(String, Vec<ParamType>, Handler)>,
}

impl Steps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step<Args, F>(mut self, pattern: &str, f: F) -> Self
    where
        F: StepFn<Args>,
    {
        self.entries
            .push((pattern.to_string(), F::signature(), f.into_handler()));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register every entry, returning the ones that were rejected.
    pub fn register_into(self, registry: &mut StepRegistry) -> Vec<RegistrationError> {
        self.entries
            .into_iter()
            .filter_map(|(pattern, signature, handler)| {
                registry.register_dynamic(&pattern, signature, handler).err()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use elicit::{Table, TextBlock};

    use super::*;

    fn noop() -> Handler {
        Box::new(|_, _| Ok(()))
    }

    #[test]
    fn signatures_come_from_closure_types() {
        let mut registry = StepRegistry::new();
        registry
            .register(r"(\d+) and (.+)", |_: &mut StepContext, _: i64, _: String, _: Table| {})
            .unwrap();
        let step = registry.get(0).unwrap();
        assert_eq!(
            step.description(),
            r#""(\\d+) and (.+)" => [fn(&mut StepContext, i64, String, Table)]"#
        );
        assert_eq!(step.captured_params().len(), 2);
        assert_eq!(step.table_count(), 1);
        assert_eq!(step.text_block_count(), 0);
    }

    #[test]
    fn handlers_receive_converted_arguments() {
        let mut registry = StepRegistry::new();
        registry
            .register(r"(\d+)", |ctx: &mut StepContext, n: i64, block: TextBlock| {
                ctx.log(format!("{} {}", n, block.content));
            })
            .unwrap();
        let mut ctx = StepContext::new();
        let args = vec![Arg::value(7i64), Arg::TextBlock(TextBlock::new("", "body"))];
        registry.get(0).unwrap().call(&mut ctx, args).unwrap();
        assert_eq!(ctx.into_log(), ["7 body"]);
    }

    #[test]
    fn error_returns_become_messages() {
        let mut registry = StepRegistry::new();
        registry
            .register("boom", |_: &mut StepContext| -> Result<(), String> {
                Err("went wrong".into())
            })
            .unwrap();
        let result = registry.get(0).unwrap().call(&mut StepContext::new(), Vec::new());
        assert_eq!(result, Err("went wrong".to_string()));
    }

    #[test]
    fn capture_count_must_match() {
        let mut registry = StepRegistry::new();
        let err = registry
            .register(r"I have (\d+) apples", |_: &mut StepContext| {})
            .unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::ParamCountMismatch { captures: 1, params: 0, .. }
        ));
        assert!(err.to_string().contains("captures 1 parameter but"));
        assert!(registry.is_empty());
    }

    #[test]
    fn non_capturing_groups_do_not_count() {
        let mut registry = StepRegistry::new();
        assert!(
            registry
                .register(r"(?:a|b) then (\d+)", |_: &mut StepContext, _: u32| {})
                .is_ok()
        );
    }

    #[test]
    fn dynamic_signatures_need_a_context_first() {
        let mut registry = StepRegistry::new();
        let err = registry
            .register_dynamic(r"(\d+)", vec![i64::param_type()], noop())
            .unwrap_err();
        assert!(matches!(err, RegistrationError::MissingContext { .. }));

        let err = registry
            .register_dynamic("x", Vec::new(), noop())
            .unwrap_err();
        assert!(matches!(err, RegistrationError::MissingContext { .. }));
    }

    #[test]
    fn attachments_must_trail_captured_parameters() {
        let mut registry = StepRegistry::new();
        let err = registry
            .register_dynamic(
                r"(\d+) and (\d+)",
                vec![ParamType::Context, ParamType::Table, i64::param_type()],
                noop(),
            )
            .unwrap_err();
        assert!(matches!(err, RegistrationError::MisplacedAttachment { .. }));

        let err = registry
            .register(r"(\d+)", |_: &mut StepContext, _: TextBlock, _: i64| {})
            .unwrap_err();
        assert!(matches!(err, RegistrationError::MisplacedAttachment { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn invalid_patterns_are_rejected() {
        let mut registry = StepRegistry::new();
        let err = registry
            .register("unclosed (", |_: &mut StepContext| {})
            .unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidPattern { .. }));
    }

    #[test]
    fn missing_transforms_are_reported_without_rejecting() {
        #[derive(Debug)]
        struct Colour;
        crate::scalar_arg!(Colour);

        let mut registry = StepRegistry::new();
        registry
            .register(r"paint it (\w+)", |_: &mut StepContext, _: Colour| {})
            .unwrap();
        let warnings = registry.check_transforms(&TransformRegistry::new());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].is_warning());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn batches_report_rejected_entries() {
        let mut registry = StepRegistry::new();
        let steps = Steps::new()
            .step("fine", |_: &mut StepContext| {})
            .step(r"(\d+)", |_: &mut StepContext| {});
        assert_eq!(steps.len(), 2);
        let errors = steps.register_into(&mut registry);
        assert_eq!(errors.len(), 1);
        assert_eq!(registry.len(), 1);
    }
}
