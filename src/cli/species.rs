//! Species list generation from the occurrence model.

use crate::cli::{SortOrder, SpeciesArgs};
use crate::config::load_default_config;
use crate::constants::occurrence::DEFAULT_THRESHOLD;
use crate::error::{Error, Result};
use crate::model::{OccurrenceModel, OnnxOccurrenceModel};
use crate::utils::date::date_to_week;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Default output file name.
const DEFAULT_OUTPUT_FILE: &str = "species_list.txt";

/// Generate a species list for a location and time of year.
///
/// Queries the configured occurrence meta model and writes one label per
/// line, usable later with `--slist`.
///
/// # Errors
///
/// Returns an error when the configuration or meta model cannot be loaded,
/// the prediction fails, or the output file cannot be written.
pub fn generate_species_list(args: &SpeciesArgs) -> Result<()> {
    let config = load_default_config()?;

    let model_name = args
        .model
        .clone()
        .or_else(|| config.defaults.model.clone())
        .ok_or_else(|| Error::Configuration {
            message: "no model specified (use -m or set defaults.model in config)".to_string(),
        })?;
    let model_config = crate::config::get_model(&config, &model_name)?;

    let meta_model_path =
        model_config
            .meta_model
            .as_ref()
            .ok_or_else(|| Error::MetaModelMissing {
                model_name: model_name.clone(),
            })?;

    let week = match (args.week, args.month, args.day) {
        (Some(week), _, _) => week,
        (None, Some(month), Some(day)) => date_to_week(month, day),
        _ => {
            return Err(Error::Configuration {
                message: "either --week or --month+--day must be specified".to_string(),
            });
        }
    };

    println!(
        "Loading model labels from: {}",
        model_config.labels.display()
    );
    let labels = read_labels_file(&model_config.labels)?;
    println!("Loaded {} species labels", labels.len());

    println!(
        "Loading occurrence model: {}",
        meta_model_path.display()
    );
    let model = OnnxOccurrenceModel::load(meta_model_path, &labels)?;

    let threshold = args.threshold.unwrap_or(DEFAULT_THRESHOLD);
    println!(
        "Predicting species for: lat={:.4}, lon={:.4}, week={week}, threshold={threshold}",
        args.lat, args.lon
    );
    let scores = model.predict_week(args.lat, args.lon, week)?;

    let species_list = build_species_list(scores, threshold, args.sort);
    println!(
        "Found {} species above threshold {threshold:.3}",
        species_list.len()
    );

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE));
    write_species_list(&output_path, &species_list)?;

    println!("Species list written to: {}", output_path.display());
    println!(
        "Sort order: {}",
        match args.sort {
            SortOrder::Freq => "by occurrence probability",
            SortOrder::Alpha => "alphabetically",
        }
    );

    Ok(())
}

/// Filter scores by threshold and order the surviving labels.
fn build_species_list(scores: Vec<(String, f32)>, threshold: f32, sort: SortOrder) -> Vec<String> {
    let mut passing: Vec<(String, f32)> = scores
        .into_iter()
        .filter(|(_, score)| *score >= threshold)
        .collect();

    match sort {
        SortOrder::Freq => {
            passing.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        }
        SortOrder::Alpha => {
            passing.sort_by(|a, b| a.0.cmp(&b.0));
        }
    }

    passing.into_iter().map(|(label, _)| label).collect()
}

fn read_labels_file(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::LabelsFileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Error::Io(e)
        }
    })?;

    let reader = BufReader::new(file);
    let mut labels = Vec::new();

    for line in reader.lines() {
        let line = line.map_err(Error::Io)?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            labels.push(trimmed.to_string());
        }
    }

    Ok(labels)
}

/// Write the species list, one `Genus species_Common Name` label per line.
fn write_species_list(path: &Path, species: &[String]) -> Result<()> {
    let mut file = File::create(path).map_err(Error::Io)?;

    for label in species {
        writeln!(file, "{label}").map_err(Error::Io)?;
    }

    file.flush().map_err(Error::Io)?;
    Ok(())
}
