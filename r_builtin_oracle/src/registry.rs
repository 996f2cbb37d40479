//! Fixture registry: annotated test cases parsed from `.R` files.
//!
//! A fixture file holds one or more case blocks:
//!
//! ```text
//! ## case: anyDuplicated.basic
//! ## policy: Ignored.ReferenceError
//! argv <- list(c(1L, 1L))
//! .Internal(anyDuplicated(argv[[1]], FALSE, FALSE))
//! ```
//!
//! The `## policy:` line is optional and defaults to `Exact`. Annotations
//! carry either an `Ignored.<Reason>` marker or an `Output.<Laxity>`
//! comparison relaxation.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::compare::{CasePolicy, IgnoredReason, Laxity};

const CASE_MARKER: &str = "## case:";
const POLICY_MARKER: &str = "## policy:";

/// One annotated conformance case.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TestCase {
    pub name: String,
    pub source: String,
    pub policy: CasePolicy,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("io error reading fixtures: {0}")]
    Io(#[from] std::io::Error),
    #[error("fixture text before the first '## case:' marker")]
    SourceOutsideCase,
    #[error("case '{case}' has an empty name")]
    EmptyName { case: usize },
    #[error("duplicate case name '{name}'")]
    DuplicateName { name: String },
    #[error("case '{case}': unknown policy annotation '{token}'")]
    UnknownPolicy { case: String, token: String },
    #[error("case '{case}' has no source")]
    EmptySource { case: String },
}

/// Cases in registration order. Order is what the reporter iterates in,
/// so loading is deterministic: files sorted by name, blocks in file
/// order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    cases: Vec<TestCase>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, case: TestCase) -> Result<(), RegistryError> {
        if self.cases.iter().any(|c| c.name == case.name) {
            return Err(RegistryError::DuplicateName { name: case.name });
        }
        self.cases.push(case);
        Ok(())
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Parse one fixture file's worth of case blocks into this registry.
    pub fn parse_str(&mut self, text: &str) -> Result<(), RegistryError> {
        let mut current: Option<(String, CasePolicy, Vec<&str>)> = None;
        let mut block_index = 0usize;

        for line in text.lines() {
            if let Some(rest) = line.strip_prefix(CASE_MARKER) {
                if let Some(done) = current.take() {
                    self.finish_block(done)?;
                }
                block_index += 1;
                let name = rest.trim().to_string();
                if name.is_empty() {
                    return Err(RegistryError::EmptyName { case: block_index });
                }
                current = Some((name, CasePolicy::Exact, Vec::new()));
                continue;
            }
            if let Some(rest) = line.strip_prefix(POLICY_MARKER) {
                let Some((name, policy, _)) = current.as_mut() else {
                    return Err(RegistryError::SourceOutsideCase);
                };
                *policy = parse_policy(name, rest.trim())?;
                continue;
            }
            match current.as_mut() {
                Some((_, _, body)) => body.push(line),
                // Blank lines and file-header comments may precede the
                // first case marker.
                None if line.trim().is_empty() || line.trim_start().starts_with('#') => {}
                None => return Err(RegistryError::SourceOutsideCase),
            }
        }
        if let Some(done) = current.take() {
            self.finish_block(done)?;
        }
        Ok(())
    }

    fn finish_block(
        &mut self,
        (name, policy, body): (String, CasePolicy, Vec<&str>),
    ) -> Result<(), RegistryError> {
        let source = body.join("\n").trim().to_string();
        if source.is_empty() {
            return Err(RegistryError::EmptySource { case: name });
        }
        self.push(TestCase {
            name,
            source,
            policy,
        })
    }

    /// Load every `*.R` file under `dir`, sorted by file name.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let mut paths: Vec<_> = fs::read_dir(dir)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "R"))
            .collect();
        paths.sort();

        let mut registry = Self::new();
        for path in paths {
            let text = fs::read_to_string(&path)?;
            registry.parse_str(&text)?;
        }
        Ok(registry)
    }
}

impl std::str::FromStr for Registry {
    type Err = RegistryError;

    fn from_str(text: &str) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.parse_str(text)?;
        Ok(registry)
    }
}

fn parse_policy(case: &str, token: &str) -> Result<CasePolicy, RegistryError> {
    let unknown = || RegistryError::UnknownPolicy {
        case: case.to_string(),
        token: token.to_string(),
    };
    if token == "Exact" {
        return Ok(CasePolicy::Exact);
    }
    if token == "Ignored" {
        // Bare marker: untriaged.
        return Ok(CasePolicy::Ignored(IgnoredReason::Unknown));
    }
    if let Some(reason) = token.strip_prefix("Ignored.") {
        let reason = match reason {
            "ReferenceError" => IgnoredReason::ReferenceError,
            "ImplementationError" => IgnoredReason::ImplementationError,
            "WrongCaller" => IgnoredReason::WrongCaller,
            "Unimplemented" => IgnoredReason::Unimplemented,
            "Unknown" => IgnoredReason::Unknown,
            _ => return Err(unknown()),
        };
        return Ok(CasePolicy::Ignored(reason));
    }
    if let Some(laxity) = token.strip_prefix("Output.") {
        let laxity = match laxity {
            "IgnoreOutputFormatting" => Laxity::IgnoreOutputFormatting,
            "IgnoreWarningContext" => Laxity::IgnoreWarningContext,
            "IgnoreErrorContext" => Laxity::IgnoreErrorContext,
            "IgnoreErrorMessage" => Laxity::IgnoreErrorMessage,
            "ContainsError" => Laxity::ContainsError,
            "ContainsWarning" => Laxity::ContainsWarning,
            _ => return Err(unknown()),
        };
        return Ok(CasePolicy::Lax(laxity));
    }
    Err(unknown())
}
