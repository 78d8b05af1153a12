//! Turning checker findings into diagnostics

use crate::checker::CallSite;
use crate::error::HandlerError;
use lh_common::{Diagnostic, DiagnosticSink, Severity};
use log::debug;

/// Records the diagnostics of one unit into the run's sink
pub struct Reporter<'a> {
    sink: &'a mut DiagnosticSink,
}

impl<'a> Reporter<'a> {
    pub fn new(sink: &'a mut DiagnosticSink) -> Self {
        Self { sink }
    }

    /// Advisory finding; the handler carries on
    pub fn warning(&mut self, message: impl Into<String>, site: &CallSite<'_>) {
        self.emit(Severity::Warning, message.into(), "call-site", site);
    }

    /// Record an error. Handlers return the result to stop work on the call.
    pub fn error(&mut self, message: impl Into<String>, site: &CallSite<'_>) -> HandlerError {
        self.emit(Severity::Error, message.into(), "call-site", site);
        HandlerError::Reported
    }

    pub(crate) fn internal_fault(&mut self, checker: &str, message: &str, site: &CallSite<'_>) {
        let diagnostic = self
            .build(
                Severity::Warning,
                format!("Internal fault in checker '{checker}'."),
                "when processing statement",
                site,
            )
            .with_note(message.to_string());
        self.sink.report(diagnostic);
    }

    fn emit(&mut self, severity: Severity, message: String, label: &str, site: &CallSite<'_>) {
        debug!("{severity} at call to {}: {message}", site.callee);
        let diagnostic = self.build(severity, message, label, site);
        self.sink.report(diagnostic);
    }

    fn build(&self, severity: Severity, message: String, label: &str, site: &CallSite<'_>) -> Diagnostic {
        let diagnostic = Diagnostic::new(severity, message);
        match site.location() {
            Some(location) => diagnostic.with_excerpt(label, location, site.unit.source()),
            None => diagnostic.at(site.function.location.clone()),
        }
    }
}
