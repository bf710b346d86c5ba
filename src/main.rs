use asset_press::config::{self, BuildLayout, IMAGE_URL_PREFIX, PipelineConfig};
use asset_press::rewrite::{TemplateRewriter, rewrite_template};
use asset_press::{assets, output, process};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "asset-press")]
#[command(about = "Responsive image and asset build for a static page")]
#[command(long_about = "\
Responsive image and asset build for a static page

Project structure (paths configurable in asset-press.toml):

  .
  ├── asset-press.toml             # Optional config
  ├── index.html                   # Template
  └── assets/
      ├── images/                  # Source PNGs (listed in [images]) and SVGs
      ├── css/                     # Copied verbatim
      └── fonts/                   # Copied verbatim

Output:

  dist/
  ├── index.html                   # <img> → <picture>, SVG names hashed
  ├── image-manifest.json
  └── assets/{images,css,fonts}/

Run 'asset-press gen-config' to generate a documented asset-press.toml.")]
#[command(version)]
struct Cli {
    /// Project root; relative paths in the config resolve against it
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file (relative to the root unless absolute)
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: clean → images → assets → html (default)
    Build,
    /// Remove and recreate the output directory
    Clean,
    /// Generate image variants and write the manifest
    Images,
    /// Copy CSS and fonts, hash SVGs into the existing manifest
    Assets,
    /// Rewrite the template from the existing manifest
    Html,
    /// Print a stock asset-press.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Build);
    let load = || -> Result<(PipelineConfig, BuildLayout), config::ConfigError> {
        let pipeline = config::load_config(&cli.root.join(&cli.config))?;
        let layout = BuildLayout::resolve(&cli.root, &pipeline.paths);
        Ok((pipeline, layout))
    };

    match command {
        Command::Build => {
            let (pipeline, layout) = load()?;
            assets::clean_output(&layout.output)?;
            output::print_clean_output(&layout.output);

            output::print_stage_header(1, "Optimizing images");
            run_images(&pipeline, &layout)?;

            output::print_stage_header(2, "Copying static assets");
            run_assets(&layout)?;

            output::print_stage_header(3, "Building HTML");
            run_html(&pipeline, &layout)?;

            println!("==> Build complete: {}", layout.output.display());
        }
        Command::Clean => {
            let (_, layout) = load()?;
            assets::clean_output(&layout.output)?;
            output::print_clean_output(&layout.output);
        }
        Command::Images => {
            let (pipeline, layout) = load()?;
            run_images(&pipeline, &layout)?;
        }
        Command::Assets => {
            let (_, layout) = load()?;
            run_assets(&layout)?;
        }
        Command::Html => {
            let (pipeline, layout) = load()?;
            run_html(&pipeline, &layout)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn run_images(
    pipeline: &PipelineConfig,
    layout: &BuildLayout,
) -> Result<(), Box<dyn std::error::Error>> {
    init_thread_pool(&pipeline.processing);
    let process_config = process::ProcessConfig::from_pipeline_config(pipeline);

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_process_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = process::process(
        &layout.source_images,
        &layout.output_images,
        &process_config,
        Some(tx),
    );
    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;
    let result = result?;

    result.manifest.save(&layout.manifest)?;
    output::print_process_summary(&layout.manifest, result.manifest.images.len());
    Ok(())
}

fn run_assets(layout: &BuildLayout) -> Result<(), Box<dyn std::error::Error>> {
    let report = assets::materialize(layout)?;
    output::print_asset_report(&report);
    Ok(())
}

fn run_html(
    pipeline: &PipelineConfig,
    layout: &BuildLayout,
) -> Result<(), Box<dyn std::error::Error>> {
    let rewriter =
        TemplateRewriter::new(IMAGE_URL_PREFIX, &pipeline.responsive.raster_extensions)?;
    let result = rewrite_template(
        &rewriter,
        &layout.template,
        &layout.manifest,
        &layout.output_html,
    )?;
    output::print_rewrite_output(&result, &layout.output_html);
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
