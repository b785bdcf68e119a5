//! Avescan - bird species detection from audio recordings.
//!
//! Decodes recordings, windows them, scores each window with an ONNX
//! classifier, filters by location/date plausibility and merges the window
//! scores into detections.

#![warn(missing_docs)]

pub mod audio;
pub mod cli;
pub mod config;
pub mod constants;
pub mod detect;
pub mod error;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod utils;
pub mod watch;

use clap::Parser;
use cli::{AnalyzeArgs, Cli, Command, WatchArgs};
use config::{
    Config, InferenceDevice, OutputFormat, config_file_path, load_default_config,
    save_default_config,
};
use detect::{Detection, OccurrenceFilter};
use model::{OnnxClassifier, OnnxOccurrenceModel, SpeciesModel};
use output::{CsvWriter, JsonResultWriter, JsonSettings, OutputWriter, output_dir_for, output_path_for};
use pipeline::{AnalyzeOptions, Recording, RecordingPipeline, collect_input_files};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use utils::date::week_from_date;
use watch::{DirectoryWatcher, WatchOptions};

pub use error::{Error, Result};

/// Main entry point for the avescan CLI.
///
/// # Errors
///
/// Returns the first unrecoverable error from the selected command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.analyze.verbose, cli.analyze.quiet);

    birdnet_onnx::init_runtime().map_err(|e| Error::ModelUnavailable {
        reason: format!("ONNX runtime initialization failed: {e}"),
    })?;

    let config = load_default_config()?;
    config::validate_config(&config)?;

    if let Some(command) = cli.command {
        return match command {
            Command::Config { action } => handle_config_command(action),
            Command::Species(args) => cli::generate_species_list(&args),
            Command::Watch(args) => watch_directory(&args, &cli.analyze, &config),
        };
    }

    if cli.inputs.is_empty() {
        return Err(Error::Configuration {
            message: "no input files given (see --help)".to_string(),
        });
    }

    analyze_files(&cli.inputs, &cli.analyze, &config)
}

/// Resolved output configuration shared by every analyzed file.
struct OutputSettings {
    formats: Vec<OutputFormat>,
    output_dir: Option<PathBuf>,
    model_name: String,
    json: JsonSettings,
}

/// Analyze input files with the given options.
fn analyze_files(inputs: &[PathBuf], args: &AnalyzeArgs, config: &Config) -> Result<()> {
    use std::time::Instant;

    let total_start = Instant::now();

    let files = collect_input_files(inputs)?;
    if files.is_empty() {
        return Err(Error::NoValidAudioFiles);
    }
    info!("Found {} audio file(s) to process", files.len());

    let (pipeline, out) = build_pipeline(args, config)?;

    let mut processed = 0;
    let mut errors = 0;
    let mut total_detections = 0;

    for file in &files {
        match analyze_and_write(&pipeline, file, &out) {
            Ok(detections) => {
                processed += 1;
                total_detections += detections.len();
            }
            Err(e) => {
                error!("Failed to process {}: {e}", file.display());
                errors += 1;
                if args.fail_fast {
                    return Err(e);
                }
            }
        }
    }

    let total_duration = total_start.elapsed().as_secs_f64();
    info!(
        "Complete: {processed} processed, {errors} errors, {total_detections} total detections in {total_duration:.2}s"
    );

    if errors > 0 && !args.fail_fast {
        warn!("{errors} file(s) had errors");
    }

    Ok(())
}

/// Watch a directory, analyzing files as they settle, until Ctrl+C.
fn watch_directory(watch_args: &WatchArgs, args: &AnalyzeArgs, config: &Config) -> Result<()> {
    let (pipeline, out) = build_pipeline(args, config)?;
    let pipeline = Arc::new(pipeline);
    let out = Arc::new(out);

    let options = WatchOptions {
        poll_interval: watch_args
            .poll_interval
            .map_or_else(|| config.watch.poll_interval(), std::time::Duration::from_secs),
        debounce: watch_args
            .debounce
            .map_or_else(|| config.watch.debounce(), std::time::Duration::from_secs),
        workers: watch_args.workers.unwrap_or(config.watch.workers),
    };

    let analyze = {
        let pipeline = Arc::clone(&pipeline);
        let out = Arc::clone(&out);
        Arc::new(move |path: &Path| analyze_and_write(&pipeline, path, &out))
            as watch::AnalyzeFn
    };
    let callback = Arc::new(|path: &Path, result: Result<Vec<Detection>>| {
        if let Ok(detections) = result {
            info!("{}: {} detections", path.display(), detections.len());
        }
    }) as watch::DetectionCallback;

    let watcher = DirectoryWatcher::start(watch_args.dir.clone(), analyze, callback, options)?;

    let (stop_tx, stop_rx) = std::sync::mpsc::channel::<()>();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    }) {
        warn!("Failed to install Ctrl+C handler: {e}");
    }
    let _ = stop_rx.recv();

    watcher.stop()
}

/// Build the analysis pipeline and output settings from CLI args and config.
fn build_pipeline(args: &AnalyzeArgs, config: &Config) -> Result<(RecordingPipeline, OutputSettings)> {
    // Resolve model files: explicit paths override the named config entry
    let (model_name, model_path, labels_path, meta_model_path) =
        if let (Some(model_path), Some(labels_path)) = (&args.model_path, &args.labels_path) {
            (
                model_path
                    .file_stem()
                    .map_or_else(|| "custom".to_string(), |s| s.to_string_lossy().to_string()),
                model_path.clone(),
                labels_path.clone(),
                args.meta_model_path.clone(),
            )
        } else {
            let name = args
                .model
                .clone()
                .or_else(|| config.defaults.model.clone())
                .ok_or_else(|| Error::Configuration {
                    message: "no model specified (use -m or set defaults.model in config)"
                        .to_string(),
                })?;
            let model_config = config::get_model(config, &name)?;
            config::validate_model_config(model_config)?;
            (
                name,
                model_config.path.clone(),
                model_config.labels.clone(),
                args.meta_model_path
                    .clone()
                    .or_else(|| model_config.meta_model.clone()),
            )
        };

    let device = if args.gpu {
        InferenceDevice::Gpu
    } else if args.cpu {
        InferenceDevice::Cpu
    } else {
        config.inference.device
    };

    info!("Loading model: {model_name}");
    let classifier = OnnxClassifier::load(&model_path, &labels_path, device)?;
    let classifier: Arc<dyn SpeciesModel> = Arc::new(classifier);

    let min_confidence = args
        .min_confidence
        .unwrap_or(config.defaults.min_confidence);
    let overlap = args.overlap.unwrap_or(config.defaults.overlap);
    let lat = args.lat.or(config.defaults.latitude);
    let lon = args.lon.or(config.defaults.longitude);
    let occurrence_threshold = args
        .occurrence_threshold
        .unwrap_or(config.defaults.occurrence_threshold);

    // Occurrence model load failures are non-fatal; analysis continues with
    // the unrestricted species set
    let occurrence_model = if lat.is_some() && lon.is_some() {
        match meta_model_path {
            Some(ref meta_path) => match OnnxOccurrenceModel::load(meta_path, classifier.labels())
            {
                Ok(model) => {
                    info!("Occurrence filter enabled: lat={lat:?}, lon={lon:?}");
                    Some(Arc::new(model) as Arc<dyn model::OccurrenceModel>)
                }
                Err(e) => {
                    warn!("Failed to load occurrence model ({e}); location filtering disabled");
                    None
                }
            },
            None => {
                warn!("Location given but model '{model_name}' has no meta model; location filtering disabled");
                None
            }
        }
    } else {
        None
    };

    let mut occurrence = OccurrenceFilter::new(occurrence_model, occurrence_threshold);

    // Static species list is the fallback when no location is usable
    if let Some(slist_path) = args.slist.as_ref().or(config.defaults.species_list.as_ref()) {
        info!("Loading species list: {}", slist_path.display());
        let species: HashSet<String> = utils::species_list::read_species_list(slist_path)?
            .into_iter()
            .collect();
        info!("Species list filter enabled: {} species loaded", species.len());
        occurrence = occurrence.with_static_list(species);
    }

    let options = AnalyzeOptions {
        min_confidence,
        overlap_secs: overlap,
        lat,
        lon,
        date: args.date,
    };

    let out = OutputSettings {
        formats: args
            .format
            .clone()
            .unwrap_or_else(|| config.defaults.formats.clone()),
        output_dir: args.output_dir.clone(),
        model_name,
        json: JsonSettings {
            min_confidence,
            overlap,
            lat,
            lon,
            week: args.date.map(week_from_date),
        },
    };

    Ok((RecordingPipeline::new(classifier, occurrence, options), out))
}

/// Analyze one file and write its result files.
fn analyze_and_write(
    pipeline: &RecordingPipeline,
    file: &Path,
    out: &OutputSettings,
) -> Result<Vec<Detection>> {
    let mut recording = Recording::from_path(file);
    pipeline.analyze(&mut recording)?;
    let detections = recording.detections()?.to_vec();
    let duration = recording.duration_secs();

    let file_output_dir = output_dir_for(file, out.output_dir.as_deref());
    let source_name = file
        .file_name()
        .map_or_else(|| file.display().to_string(), |n| n.to_string_lossy().to_string());

    for format in &out.formats {
        let output_path = output_path_for(file, &file_output_dir, *format);
        debug!("Writing {format} output: {}", output_path.display());

        let mut writer: Box<dyn OutputWriter> = match format {
            OutputFormat::Csv => Box::new(CsvWriter::new(&output_path, file)?),
            OutputFormat::Json => Box::new(JsonResultWriter::new(
                &output_path,
                &source_name,
                duration,
                &out.model_name,
                out.json.clone(),
            )),
        };

        writer.write_detections(&detections)?;
        writer.finalize()?;
    }

    Ok(detections)
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // ORT logging is suppressed by default because CUDA fallback is expected
    // in auto mode. Use -v for warnings, -vv for info, -vvv for full trace.
    let filter_str = if quiet {
        "warn,ort=off".to_string()
    } else {
        match verbose {
            0 => "info,ort=off".to_string(),
            1 => "debug,ort=warn".to_string(),
            2 => "trace,ort=info".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    fmt().with_env_filter(filter).init();
}

fn handle_config_command(action: cli::ConfigAction) -> Result<()> {
    use cli::ConfigAction;

    match action {
        ConfigAction::Init => {
            let path = config_file_path()?;
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                let config = Config::default();
                let saved_path = save_default_config(&config)?;
                println!("Created configuration file: {}", saved_path.display());
                println!("\nAdd a model under [models.<name>] with path, labels and");
                println!("optionally meta_model, then set defaults.model.");
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_default_config()?;
            println!("{config:#?}");
            Ok(())
        }
        ConfigAction::Path => {
            let path = config_file_path()?;
            println!("{}", path.display());
            Ok(())
        }
    }
}
