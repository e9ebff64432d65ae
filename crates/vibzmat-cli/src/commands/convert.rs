use crate::cli::ConvertArgs;
use crate::config::PartialAppConfig;
use crate::error::Result;
use crate::utils::formats::{read_geometries, write_geometries};
use tracing::{debug, info};

pub fn run(args: ConvertArgs, config: &PartialAppConfig) -> Result<()> {
    let start_index = config.start_index(args.start_index);
    let mut geometries = Vec::new();
    for input in &args.inputs {
        let read = read_geometries(input, start_index)?;
        debug!(geometries = read.len(), "Read {:?}", input);
        geometries.extend(read);
    }

    let options = config.write_options(&args.output_options);
    write_geometries(&args.output, &geometries, &options)?;

    info!(
        inputs = args.inputs.len(),
        geometries = geometries.len(),
        "Trajectory written to {:?}",
        &args.output
    );
    println!(
        "Wrote {} geometries to {}",
        geometries.len(),
        args.output.display()
    );
    Ok(())
}
