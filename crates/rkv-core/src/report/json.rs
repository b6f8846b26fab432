//! JSON report generation

use crate::verifier::VerificationReport;
use crate::CoreResult;

pub fn generate(report: &VerificationReport) -> CoreResult<String> {
    serde_json::to_string_pretty(report)
        .map_err(|e| crate::CoreError::Report(format!("JSON serialization failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verifier::VerificationStatus;
    use chrono::Utc;
    use std::path::PathBuf;
    use uuid::Uuid;

    #[test]
    fn test_status_and_optional_fields() {
        let report = VerificationReport {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            completed_at: Utc::now(),
            install_dir: PathBuf::from("/work/install"),
            total_steps: 7,
            steps: Vec::new(),
            status: VerificationStatus::Failed,
            aborted_at: Some("Architecture".to_string()),
            primary_sha256: None,
            deployment: Vec::new(),
        };
        let value: serde_json::Value = serde_json::from_str(&generate(&report).unwrap()).unwrap();

        assert_eq!(value["status"], "failed");
        assert_eq!(value["aborted_at"], "Architecture");
        assert!(value.get("primary_sha256").is_none());
        assert!(value.get("deployment").is_none());
    }
}
