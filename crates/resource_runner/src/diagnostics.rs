//! Structured diagnostics returned across the lifecycle boundary.

use serde::Serialize;
use std::fmt;

use crate::RunnerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
        };
        if self.detail.is_empty() {
            write!(f, "{}: {}", label, self.summary)
        } else {
            write!(f, "{}: {}\n  {}", label, self.summary, self.detail)
        }
    }
}

impl From<&RunnerError> for Diagnostic {
    fn from(err: &RunnerError) -> Self {
        match err {
            RunnerError::Remote { action, source } => Self::error(action.clone(), source.to_string()),
            RunnerError::NotFound { summary, detail } => Self::error(summary.clone(), detail.clone()),
            RunnerError::Cancelled { action } => Self::error(
                "operation cancelled",
                format!("stopped before: {}", action),
            ),
            RunnerError::InvalidMember {
                field,
                entry,
                reason,
            } => Self::error(
                format!("invalid entry in {}", field),
                format!("{:?}: {}", entry, reason),
            ),
            RunnerError::Decode { type_name, message } => {
                Self::error(format!("invalid {} attributes", type_name), message.clone())
            }
            RunnerError::UnknownType { kind, type_name } => {
                Self::error(format!("unknown {} type", kind), type_name.clone())
            }
        }
    }
}

impl From<RunnerError> for Diagnostic {
    fn from(err: RunnerError) -> Self {
        Self::from(&err)
    }
}

/// Ordered collection of diagnostics from one or more operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn has_error(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Self(vec![diagnostic])
    }
}

impl From<RunnerError> for Diagnostics {
    fn from(err: RunnerError) -> Self {
        Diagnostic::from(err).into()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

#[cfg(test)]
mod tests {
    use super::*;
    use slackctl_api::ApiError;

    #[test]
    fn test_remote_error_keeps_action_as_summary() {
        let err = RunnerError::Remote {
            action: "failed to create conversation".to_string(),
            source: ApiError::platform("conversations.create", "name_taken"),
        };
        let diagnostic = Diagnostic::from(err);

        assert_eq!(diagnostic.severity, Severity::Error);
        assert_eq!(diagnostic.summary, "failed to create conversation");
        assert_eq!(diagnostic.detail, "conversations.create failed: name_taken");
    }

    #[test]
    fn test_has_error_ignores_warnings() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::warning("slow", ""));
        assert!(!diagnostics.has_error());

        diagnostics.push(Diagnostic::error("broken", "detail"));
        assert!(diagnostics.has_error());
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_display() {
        let diagnostics: Diagnostics = Diagnostic::error("failed to close conversation", "x").into();
        assert_eq!(diagnostics.to_string(), "Error: failed to close conversation\n  x");
    }
}
