//! Configuration validation.

use crate::config::{Config, ModelConfig};
use crate::constants::confidence;
use crate::error::{Error, Result};

/// Validate the entire configuration.
///
/// # Errors
///
/// Returns [`Error::Configuration`] or a more specific variant for the first
/// invalid setting found.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_defaults(config)?;
    validate_location(config)?;
    validate_watch(config)?;
    Ok(())
}

fn validate_defaults(config: &Config) -> Result<()> {
    let defaults = &config.defaults;

    if !(confidence::MIN..=confidence::MAX).contains(&defaults.min_confidence) {
        return Err(Error::Configuration {
            message: format!(
                "min_confidence must be between {} and {}, got {}",
                confidence::MIN,
                confidence::MAX,
                defaults.min_confidence
            ),
        });
    }

    if defaults.overlap < 0.0 {
        return Err(Error::Configuration {
            message: format!("overlap must be non-negative, got {}", defaults.overlap),
        });
    }

    if !(0.0..=1.0).contains(&defaults.occurrence_threshold) {
        return Err(Error::Configuration {
            message: format!(
                "occurrence_threshold must be between 0.0 and 1.0, got {}",
                defaults.occurrence_threshold
            ),
        });
    }

    if let Some(ref model_name) = defaults.model
        && !config.models.contains_key(model_name)
    {
        return Err(Error::ModelNotFound {
            name: model_name.clone(),
        });
    }

    Ok(())
}

fn validate_location(config: &Config) -> Result<()> {
    if let Some(lat) = config.defaults.latitude
        && !(-90.0..=90.0).contains(&lat)
    {
        return Err(Error::InvalidLatitude { value: lat });
    }

    if let Some(lon) = config.defaults.longitude
        && !(-180.0..=180.0).contains(&lon)
    {
        return Err(Error::InvalidLongitude { value: lon });
    }

    Ok(())
}

fn validate_watch(config: &Config) -> Result<()> {
    if config.watch.workers == 0 {
        return Err(Error::Configuration {
            message: "watch.workers must be at least 1".to_string(),
        });
    }

    if config.watch.poll_interval_secs == 0 {
        return Err(Error::Configuration {
            message: "watch.poll_interval_secs must be at least 1".to_string(),
        });
    }

    Ok(())
}

/// Validate a model configuration and check its files exist.
///
/// # Errors
///
/// Returns a not-found error for the first missing file.
pub fn validate_model_config(model: &ModelConfig) -> Result<()> {
    if !model.path.exists() {
        return Err(Error::ModelFileNotFound {
            path: model.path.clone(),
        });
    }

    if !model.labels.exists() {
        return Err(Error::LabelsFileNotFound {
            path: model.labels.clone(),
        });
    }

    if let Some(meta_path) = &model.meta_model
        && !meta_path.exists()
    {
        return Err(Error::ModelFileNotFound {
            path: meta_path.clone(),
        });
    }

    Ok(())
}

/// Get a model by name from the config.
///
/// # Errors
///
/// Returns [`Error::ModelNotFound`] for an unknown name.
pub fn get_model<'a>(config: &'a Config, name: &str) -> Result<&'a ModelConfig> {
    config.models.get(name).ok_or_else(|| Error::ModelNotFound {
        name: name.to_string(),
    })
}
