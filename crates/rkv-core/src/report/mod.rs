//! Report generation

pub mod deploy;
pub mod json;
pub mod text;

use crate::verifier::VerificationReport;
use crate::CoreResult;

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

/// Generate report in specified format
pub fn generate_report(report: &VerificationReport, format: ReportFormat) -> CoreResult<String> {
    match format {
        ReportFormat::Text => Ok(text::generate(report)),
        ReportFormat::Json => json::generate(report),
    }
}
