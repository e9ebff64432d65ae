use crate::core::models::zmat::ConstantTable;
use crate::engine::cartesian::CartesianVibration;
use crate::engine::config::VibrationConfig;
use crate::engine::error::EngineError;
use crate::engine::internal::ZmatVibration;
use crate::engine::progress::{Progress, ProgressReporter};
use std::path::Path;
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy)]
pub struct VibrationRequest<'a> {
    pub molden_path: &'a Path,
    /// CSV construction table; derived from the reference geometry when absent.
    pub table_path: Option<&'a Path>,
    /// Also project the modes into internal coordinates.
    pub internal: bool,
}

#[derive(Debug, Clone)]
pub struct VibrationAnalysis {
    pub cartesian: CartesianVibration,
    pub internal: Option<ZmatVibration>,
}

#[instrument(skip_all, name = "vibration_workflow")]
pub fn run(
    request: &VibrationRequest,
    config: &VibrationConfig,
    reporter: &ProgressReporter,
) -> Result<VibrationAnalysis, EngineError> {
    let cartesian = reporter.phase("Reading modes", || {
        CartesianVibration::read_molden(request.molden_path, config)
    })?;
    reporter.report(Progress::Message(cartesian.to_string()));

    let internal = if request.internal {
        let table = request
            .table_path
            .map(ConstantTable::load_csv)
            .transpose()?;
        let internal = reporter.phase("Internal projection", || {
            ZmatVibration::from_cart_vib(&cartesian, table.as_ref(), reporter)
        })?;
        reporter.report(Progress::Message(internal.to_string()));
        Some(internal)
    } else {
        None
    };

    info!(
        modes = cartesian.len(),
        internal = internal.is_some(),
        "Vibration workflow complete."
    );
    Ok(VibrationAnalysis {
        cartesian,
        internal,
    })
}
