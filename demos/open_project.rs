// Example usage of the ICB project reader

use icb_reader::{check_valid_path, open_project, PathStatus, Result};
use std::path::Path;
use tracing::{info, warn, Level};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    let dir = std::env::args().nth(1).unwrap_or_else(|| "data/project/".to_string());

    if check_valid_path(Path::new(&dir))? == PathStatus::Cancelled {
        info!("Nothing to open");
        return Ok(());
    }

    let project = open_project(&dir)?;

    info!("Samples: {}", project.samples.len());
    match &project.timestamps {
        Some(ts) if !ts.is_empty() => {
            info!("First: {} = {}", ts[0], project.samples[0]);
            info!("Last:  {} = {}", ts[ts.len() - 1], project.samples[ts.len() - 1]);
        }
        Some(_) => info!("Timeline is empty"),
        None => info!("No timeline (missing .cal file)"),
    }

    if let Some(warning) = &project.annotation_warning {
        warn!("{}", warning);
    }

    info!("Annotations:");
    for annotation in project.annotations.annotations() {
        info!(
            "  [{}] {} {} .. {}",
            annotation.id, annotation.title, annotation.start, annotation.end
        );
        match project.vertical_extent(annotation.id) {
            Ok(extent) => info!("      min {} max {}", extent.min, extent.max),
            Err(e) => info!("      {}", e),
        }
    }

    Ok(())
}
