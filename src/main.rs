use emulsion_rs::image_pipeline::{
    DemosaicAlgorithm, ExportConfig, RenderConfig, RenderPipeline, TiffCompression,
};
use emulsion_rs::logger;

use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logger::init();

    info!("Starting emulsion...");

    let config = RenderConfig::builder()
        .demosaic(DemosaicAlgorithm::Ahd)
        .tone_map(true)
        .export(
            ExportConfig::builder()
                .compression(TiffCompression::None)
                .build(),
        )
        .build();
    let pipeline = RenderPipeline::new(config)?;

    info!("Develop pipeline initialized");
    info!("Demosaic: {:?}", pipeline.config().demosaic);
    info!(
        "Tone mapping: {}",
        if pipeline.config().tone_map {
            "enabled"
        } else {
            "disabled"
        }
    );

    match pipeline.develop_file("input.dng", "output.tiff") {
        Ok(timings) => {
            info!("Develop successful!");
            timings.print_summary();
        }
        Err(e) => error!("Develop failed: {}", e),
    }

    Ok(())
}
