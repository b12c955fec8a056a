//! Build outcomes and the text frames sent to browser clients.
//!
//! A frame is either the bare tag `reload` or `error:` followed by the
//! diagnostic text. Clients must ignore any other prefix.

use kiln_bundler::{BuildOutput, format_messages};
use std::fmt;

const RELOAD_TAG: &str = "reload";
const ERROR_PREFIX: &str = "error:";

/// Separator between diagnostics inside a single `error:` frame.
pub const DIAGNOSTIC_SEPARATOR: &str = "\n\n";

/// Classified result of one rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Success,
    Failure { diagnostics: Vec<String> },
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Success)
    }

    /// Failure carrying a single message, used when the builder could not run.
    pub fn failed(message: impl Into<String>) -> Self {
        BuildOutcome::Failure {
            diagnostics: vec![message.into()],
        }
    }
}

impl From<&BuildOutput> for BuildOutcome {
    fn from(output: &BuildOutput) -> Self {
        if output.is_success() {
            BuildOutcome::Success
        } else {
            BuildOutcome::Failure {
                diagnostics: format_messages(&output.diagnostics),
            }
        }
    }
}

/// Payload pushed to every connected client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadMessage {
    Reload,
    Error { text: String },
}

impl ReloadMessage {
    /// Encode as a text frame.
    pub fn to_wire(&self) -> String {
        match self {
            ReloadMessage::Reload => RELOAD_TAG.to_string(),
            ReloadMessage::Error { text } => format!("{ERROR_PREFIX}{text}"),
        }
    }

    /// Decode a text frame. Unknown frames yield `None`.
    pub fn parse(frame: &str) -> Option<Self> {
        if frame == RELOAD_TAG {
            return Some(ReloadMessage::Reload);
        }
        frame
            .strip_prefix(ERROR_PREFIX)
            .map(|text| ReloadMessage::Error {
                text: text.to_string(),
            })
    }
}

impl From<&BuildOutcome> for ReloadMessage {
    fn from(outcome: &BuildOutcome) -> Self {
        match outcome {
            BuildOutcome::Success => ReloadMessage::Reload,
            BuildOutcome::Failure { diagnostics } => ReloadMessage::Error {
                text: diagnostics.join(DIAGNOSTIC_SEPARATOR),
            },
        }
    }
}

impl fmt::Display for ReloadMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_bundler::Diagnostic;

    #[test]
    fn test_wire_format() {
        assert_eq!(ReloadMessage::Reload.to_wire(), "reload");
        assert_eq!(
            ReloadMessage::Error {
                text: "src/app.tsx:1:1: error: boom".into()
            }
            .to_wire(),
            "error:src/app.tsx:1:1: error: boom"
        );
    }

    #[test]
    fn test_parse_known_and_unknown_frames() {
        assert_eq!(ReloadMessage::parse("reload"), Some(ReloadMessage::Reload));
        assert_eq!(
            ReloadMessage::parse("error:a:b"),
            Some(ReloadMessage::Error { text: "a:b".into() })
        );
        assert_eq!(ReloadMessage::parse("css:app.css"), None);
        assert_eq!(ReloadMessage::parse("reloaded"), None);
    }

    #[test]
    fn test_failure_joins_diagnostics() {
        let outcome = BuildOutcome::Failure {
            diagnostics: vec!["first".into(), "second".into()],
        };

        assert_eq!(
            ReloadMessage::from(&outcome),
            ReloadMessage::Error {
                text: "first\n\nsecond".into()
            }
        );
        assert_eq!(ReloadMessage::from(&BuildOutcome::Success), ReloadMessage::Reload);
    }

    #[test]
    fn test_outcome_from_build_output() {
        let ok = BuildOutput::default();
        assert_eq!(BuildOutcome::from(&ok), BuildOutcome::Success);

        let failed = BuildOutput::from_diagnostics(vec![], vec![Diagnostic::error("broken")]);
        assert_eq!(
            BuildOutcome::from(&failed),
            BuildOutcome::Failure {
                diagnostics: vec!["error: broken".into()]
            }
        );
    }
}
