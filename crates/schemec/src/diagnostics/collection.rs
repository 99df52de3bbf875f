//! Diagnostics collection for accumulating messages across pipeline stages.

use schemec_support::Span;

use super::message::{DiagnosticMessage, Fix, RelatedInfo, Severity};

/// Collection of diagnostic messages produced by one compilation.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics(Vec<DiagnosticMessage>);

/// Builder for a single diagnostic, returned by [`Diagnostics::report`] and
/// the severity-specific helpers. Nothing is recorded until [`emit`] is
/// called.
#[must_use = "diagnostic not emitted, call .emit()"]
pub struct DiagnosticBuilder<'a> {
    diagnostics: &'a mut Diagnostics,
    message: DiagnosticMessage,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn report(&mut self, severity: Severity, span: Span, msg: impl Into<String>) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            diagnostics: self,
            message: DiagnosticMessage::new(severity, span, msg),
        }
    }

    pub fn debug(&mut self, span: Span, msg: impl Into<String>) -> DiagnosticBuilder<'_> {
        self.report(Severity::Debug, span, msg)
    }

    pub fn verbose(&mut self, span: Span, msg: impl Into<String>) -> DiagnosticBuilder<'_> {
        self.report(Severity::Verbose, span, msg)
    }

    pub fn info(&mut self, span: Span, msg: impl Into<String>) -> DiagnosticBuilder<'_> {
        self.report(Severity::Info, span, msg)
    }

    pub fn warning(&mut self, span: Span, msg: impl Into<String>) -> DiagnosticBuilder<'_> {
        self.report(Severity::Warning, span, msg)
    }

    pub fn error(&mut self, span: Span, msg: impl Into<String>) -> DiagnosticBuilder<'_> {
        self.report(Severity::Error, span, msg)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticMessage> {
        self.0.iter()
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(DiagnosticMessage::is_error)
    }

    pub fn has_warnings(&self) -> bool {
        self.0.iter().any(DiagnosticMessage::is_warning)
    }

    pub fn error_count(&self) -> usize {
        self.0.iter().filter(|d| d.is_error()).count()
    }

    pub fn filter_by_severity(&self, severity: Severity) -> Vec<&DiagnosticMessage> {
        self.0.iter().filter(|d| d.severity == severity).collect()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }
}

impl<'a> DiagnosticBuilder<'a> {
    pub fn related_to(mut self, span: Span, msg: impl Into<String>) -> Self {
        self.message.related.push(RelatedInfo::new(span, msg));
        self
    }

    pub fn fix(mut self, description: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.message.fix = Some(Fix::new(replacement, description));
        self
    }

    pub fn emit(self) {
        self.diagnostics.0.push(self.message);
    }
}

impl IntoIterator for Diagnostics {
    type Item = DiagnosticMessage;
    type IntoIter = std::vec::IntoIter<DiagnosticMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticMessage;
    type IntoIter = std::slice::Iter<'a, DiagnosticMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::new(Default::default(), 3)
    }

    #[test]
    fn emitted_diagnostic_is_recorded() {
        let mut diags = Diagnostics::new();
        diags.error(span(), "bad token").emit();
        assert_eq!(diags.len(), 1);
        assert!(diags.has_errors());
    }

    #[test]
    fn unemitted_builder_records_nothing() {
        let mut diags = Diagnostics::new();
        let _ = diags.warning(span(), "unused binding");
        assert!(diags.is_empty());
    }

    #[test]
    fn severities_order_debug_below_error() {
        assert!(Severity::Debug < Severity::Error);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn filter_by_severity_only_returns_matches() {
        let mut diags = Diagnostics::new();
        diags.error(span(), "e").emit();
        diags.warning(span(), "w").emit();
        diags.warning(span(), "w2").emit();
        assert_eq!(diags.filter_by_severity(Severity::Warning).len(), 2);
    }
}
