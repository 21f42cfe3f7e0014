/*
Copyright 2020 Google LLC

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    https://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use backtrace::Backtrace;
use std::cell::RefCell;
use thiserror::Error;

use ravel_common::manifest::Declaration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DiagnosticKind {
    #[error("duplicate binding")]
    DuplicateBinding,
    #[error("missing binding")]
    MissingBinding,
    #[error("dependency cycle")]
    DependencyCycle,
    #[error("incompatibly scoped binding")]
    IncompatiblyScopedBinding,
    #[error("assisted inject misuse")]
    AssistedInjectMisuse,
    #[error("empty multibinding")]
    EmptyMultibinding,
    #[error("overlapping ancestor scope")]
    OverlappingAncestorScope,
    #[error("graph self cycle")]
    GraphSelfCycle,
    #[error("non-extendable parent")]
    NonExtendableParent,
    #[error("compiler bug")]
    CompilerBug,
}

#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub declaration: Option<Declaration>,
}

/// Sentinel returned once a fatal diagnostic has been reported. Aborts
/// resolution of the current compilation unit; the outer driver may catch it
/// and continue with the next unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("graph resolution aborted by a fatal diagnostic")]
pub struct FatalError;

pub type Result<T> = std::result::Result<T, FatalError>;

/// Per-compilation-unit diagnostic sink. Interior mutability keeps reporting
/// available from shared borrows; the resolver is single-threaded.
#[derive(Debug, Default)]
pub struct Diagnostics {
    reports: RefCell<Vec<Diagnostic>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn report(
        &self,
        declaration: Option<&Declaration>,
        kind: DiagnosticKind,
        message: impl Into<String>,
    ) {
        self.reports.borrow_mut().push(Diagnostic {
            kind,
            message: message.into(),
            declaration: declaration.cloned(),
        });
    }

    /// Reports and aborts the unit.
    pub fn fatal<T>(
        &self,
        declaration: Option<&Declaration>,
        kind: DiagnosticKind,
        message: impl Into<String>,
    ) -> Result<T> {
        self.report(declaration, kind, message);
        Err(FatalError)
    }

    /// An invariant violation inside the resolver itself. Always fatal; the
    /// captured backtrace goes into the message so the host compiler surfaces
    /// it verbatim.
    pub fn compiler_bug<T>(
        &self,
        declaration: Option<&Declaration>,
        message: impl Into<String>,
    ) -> Result<T> {
        let location = declaration
            .map(|declaration| format!(" at {}", declaration.readable()))
            .unwrap_or_default();
        let backtrace = Backtrace::new();
        self.fatal(
            declaration,
            DiagnosticKind::CompilerBug,
            format!("{}{}\n{:#?}", message.into(), location, backtrace),
        )
    }

    pub fn has_errors(&self) -> bool {
        !self.reports.borrow().is_empty()
    }

    /// Aborts the unit when any non-fatal diagnostic accumulated earlier.
    pub fn bail_if_errors(&self) -> Result<()> {
        if self.has_errors() {
            return Err(FatalError);
        }
        Ok(())
    }

    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.reports.borrow().clone()
    }

    pub fn take(&self) -> Vec<Diagnostic> {
        self.reports.borrow_mut().drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_reports_and_aborts() {
        let diagnostics = Diagnostics::new();
        let result: Result<()> = diagnostics.fatal(None, DiagnosticKind::MissingBinding, "gone");
        assert_eq!(result, Err(FatalError));
        let reports = diagnostics.snapshot();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, DiagnosticKind::MissingBinding);
    }

    #[test]
    fn compiler_bug_carries_backtrace() {
        let diagnostics = Diagnostics::new();
        let result: Result<()> = diagnostics.compiler_bug(None, "broken invariant");
        assert!(result.is_err());
        let reports = diagnostics.take();
        assert_eq!(reports[0].kind, DiagnosticKind::CompilerBug);
        assert!(reports[0].message.starts_with("broken invariant"));
    }
}
