use crate::cli::ViewArgs;
use crate::config::PartialAppConfig;
use crate::error::{CliError, Result};
use crate::utils::formats::read_geometries;
use tracing::info;
use vibzmat::core::io::viewer::{self, ViewTarget, ViewerConfig};

pub fn run(args: ViewArgs, config: &PartialAppConfig) -> Result<()> {
    let start_index = config.start_index(None);
    let mut geometries = Vec::new();
    for input in &args.inputs {
        geometries.extend(read_geometries(input, start_index)?);
    }

    let viewer_config = merged_viewer_config(&args, config);
    let target = match geometries.as_slice() {
        [] => {
            return Err(CliError::Argument(
                "The inputs contain no geometries to show".to_string(),
            ));
        }
        [single] => ViewTarget::Single(single),
        all => ViewTarget::Trajectory(all),
    };

    let handle = viewer::view(target, &viewer_config)?;
    info!(
        geometries = geometries.len(),
        "Viewer file written to {:?}",
        handle.path()
    );
    println!(
        "Opened {} geometries with '{}' ({})",
        geometries.len(),
        viewer_config.program,
        handle.path().display()
    );
    handle.wait()?;
    Ok(())
}

fn merged_viewer_config(args: &ViewArgs, config: &PartialAppConfig) -> ViewerConfig {
    let mut viewer_config = config.viewer_config();
    if let Some(program) = &args.program {
        viewer_config.program = program.clone();
    }
    if args.keep {
        viewer_config.use_current_dir = true;
    }
    viewer_config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const WATER: &str = "\
3

O 0.0 0.0 0.1
H 0.0 0.75 -0.4
H 0.0 -0.75 -0.4
";

    fn view_args(program: Option<&str>, keep: bool) -> ViewArgs {
        ViewArgs {
            inputs: vec![],
            program: program.map(str::to_string),
            keep,
        }
    }

    #[test]
    fn cli_flags_override_configured_viewer() {
        let mut config = PartialAppConfig::default();
        config
            .apply_set_values(&["viewer.program=avogadro".to_string()])
            .unwrap();

        let from_file = merged_viewer_config(&view_args(None, false), &config);
        assert_eq!(from_file.program, "avogadro");
        assert!(!from_file.use_current_dir);

        let overridden = merged_viewer_config(&view_args(Some("jmol"), true), &config);
        assert_eq!(overridden.program, "jmol");
        assert!(overridden.use_current_dir);
    }

    #[cfg(unix)]
    #[test]
    fn viewer_exit_status_is_propagated() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("water.xyz");
        fs::write(&input, WATER).unwrap();

        let mut ok_args = view_args(Some("true"), false);
        ok_args.inputs = vec![input.clone()];
        assert!(run(ok_args, &PartialAppConfig::default()).is_ok());

        let mut failing_args = view_args(Some("false"), false);
        failing_args.inputs = vec![input];
        assert!(matches!(
            run(failing_args, &PartialAppConfig::default()),
            Err(CliError::Viewer(_))
        ));
    }
}
