//! Report generation port trait.

use std::path::Path;

use crate::domain::error::SignalbenchError;
use crate::domain::evaluation::EvaluationReport;

/// Port for persisting evaluation reports.
pub trait ReportPort {
    fn write(
        &self,
        reports: &[EvaluationReport],
        output_dir: &Path,
    ) -> Result<(), SignalbenchError>;
}
