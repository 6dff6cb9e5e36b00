//! Resolution options.

use weft_model::ContributionBinding;

/// Severity a configurable validation reports at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    Error,
    Warning,
    Note,
}

/// How a configurable validation is surfaced, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValidationType {
    Error,
    Warning,
    Note,
    #[default]
    None,
}

impl ValidationType {
    pub fn diagnostic_kind(self) -> Option<DiagnosticKind> {
        match self {
            ValidationType::Error => Some(DiagnosticKind::Error),
            ValidationType::Warning => Some(DiagnosticKind::Warning),
            ValidationType::Note => Some(DiagnosticKind::Note),
            ValidationType::None => None,
        }
    }
}

/// Options that change how the resolver classifies bindings.
#[derive(Debug, Clone, Default)]
pub struct CompilerOptions {
    /// How an explicit binding that conflicts with a constructor-injection
    /// binding is reported. Unless this is [`ValidationType::Error`], the
    /// duplicate-binding check ignores injection bindings so a floating
    /// injection binding is not silently re-resolved over.
    pub explicit_binding_conflicts_with_inject: ValidationType,

    /// When set, map multibinding delegate keys are unwrapped before being
    /// matched against delegate declarations, so an `@IntoMap` delegate
    /// counts as explicitly installed in its module's component.
    pub strict_multibindings: bool,
}

impl CompilerOptions {
    /// Whether strict multibinding matching applies to this binding.
    pub fn use_strict_multibindings(&self, binding: &ContributionBinding) -> bool {
        self.strict_multibindings && binding.key().multibinding_contribution_id().is_some()
    }
}
