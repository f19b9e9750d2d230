#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::Result;
use clap::Parser;
use log::info;
use spark_aerial::cli::Cli;
use spark_aerial::config::AerialConfig;
use spark_aerial::dispatch::Dispatcher;
use spark_aerial::input::{discover_images, manifest_path, Manifest};
use spark_aerial::pipeline::RunContext;
use spark_aerial::sink::text::TextSink;
use spark_aerial::sink::visual::VisualSink;
use spark_aerial::sink::{OutputMode, OutputSink};
use spark_inference::inference::rotated::inference_rotated_detect::DetectorFactory;
use tracing_subscriber::filter::LevelFilter;

fn log_init() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::INFO)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    log_init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    start(&cli, config).await
}

#[cfg(feature = "onnx")]
async fn start(cli: &Cli, config: AerialConfig) -> Result<()> {
    use spark_inference::inference::rotated::inference_rotated_detect::OnnxDetectorFactory;

    let model_path = cli
        .model
        .clone()
        .ok_or_else(|| anyhow::anyhow!("--model is required"))?;
    let factory = OnnxDetectorFactory {
        model_path,
        normalization: config.normalization.into(),
    };
    run(cli, config, factory).await
}

#[cfg(not(feature = "onnx"))]
async fn start(_cli: &Cli, _config: AerialConfig) -> Result<()> {
    anyhow::bail!("Built without a detector backend, rebuild with `--features onnx`")
}

#[cfg_attr(not(feature = "onnx"), allow(dead_code))]
async fn run<F: DetectorFactory + 'static>(cli: &Cli, config: AerialConfig, factory: F) -> Result<()> {
    let context = RunContext::from_config(&config)?;
    let providers = cli.providers()?;
    let mode = if cli.show_box {
        OutputMode::Visual
    } else {
        OutputMode::Text
    };

    let manifest = match mode {
        OutputMode::Text => Some(Manifest::load_or_create(&manifest_path(&cli.save_dir, &config.version))?),
        OutputMode::Visual => None,
    };
    let images = discover_images(&cli.test_dir, manifest.as_ref(), cli.num_imgs)?;
    info!(
        "Testing {} images on {} workers ({:?} output)",
        images.len(),
        providers.len(),
        mode
    );

    let mut sink: Box<dyn OutputSink> = match mode {
        OutputMode::Text => Box::new(TextSink::create(&cli.save_dir, &config.version, &context.labels)?),
        OutputMode::Visual => Box::new(VisualSink::create(
            &cli.save_dir,
            &config.version,
            context.labels.clone(),
            config.vis_score,
            cli.font.as_deref(),
        )?),
    };

    let summary = Dispatcher::new(context, factory, providers, config.queue_capacity)
        .run(images, sink.as_mut())
        .await?;
    info!("Finished: {:?}", summary);

    Ok(())
}
