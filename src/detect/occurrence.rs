//! Location/date-based species occurrence filtering.
//!
//! The filter delegates scoring to an opaque occurrence model and owns only
//! the caching and fallback policy: results are cached per (rounded
//! location, week) key for the lifetime of one pipeline run, and a missing
//! or failing model degrades to the universal species set with a warning.

use crate::constants::occurrence::{LOCATION_KEY_DECIMALS, SEASON_MIDPOINT_WEEKS};
use crate::model::OccurrenceModel;
use crate::utils::date::week_from_date;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// The set of species plausible for a given (location, date) pair.
///
/// Never mutated after creation; consumed read-only by the scorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OccurrenceSet {
    /// No restriction; every species is allowed.
    Universal,
    /// Only the listed species labels are allowed.
    Restricted(HashSet<String>),
}

impl OccurrenceSet {
    /// Whether the given species label passes the restriction.
    pub fn contains(&self, label: &str) -> bool {
        match self {
            Self::Universal => true,
            Self::Restricted(set) => set.contains(label),
        }
    }

    /// Number of allowed species, or `None` for the universal set.
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Universal => None,
            Self::Restricted(set) => Some(set.len()),
        }
    }

    /// Whether this is the unrestricted universal set.
    pub fn is_universal(&self) -> bool {
        matches!(self, Self::Universal)
    }
}

/// Cache key: location rounded to a coarse grid plus the `BirdNET` week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct OccurrenceKey {
    lat_grid: i64,
    lon_grid: i64,
    week: Option<u32>,
}

impl OccurrenceKey {
    fn new(lat: f64, lon: f64, week: Option<u32>) -> Self {
        let scale = 10f64.powi(LOCATION_KEY_DECIMALS);
        #[allow(clippy::cast_possible_truncation)]
        Self {
            lat_grid: (lat * scale).round() as i64,
            lon_grid: (lon * scale).round() as i64,
            week,
        }
    }
}

/// Computes and caches occurrence restrictions for one pipeline run.
///
/// The cache is scoped to this object's lifetime; concurrent workers share it
/// behind a lock. A duplicate computation under contention is harmless, so no
/// stronger guarantee than lock-per-lookup is needed.
pub struct OccurrenceFilter {
    model: Option<Arc<dyn OccurrenceModel>>,
    threshold: f32,
    static_list: Option<Arc<OccurrenceSet>>,
    cache: Mutex<HashMap<OccurrenceKey, Arc<OccurrenceSet>>>,
}

impl OccurrenceFilter {
    /// Create a filter backed by an occurrence model.
    ///
    /// Pass `None` when no meta model is available; every location lookup
    /// then degrades to the fallback set with a warning.
    pub fn new(model: Option<Arc<dyn OccurrenceModel>>, threshold: f32) -> Self {
        Self {
            model,
            threshold,
            static_list: None,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Use a static species list as the restriction whenever no location is
    /// available (and as the fallback when the occurrence model fails).
    pub fn with_static_list(mut self, species: HashSet<String>) -> Self {
        self.static_list = Some(Arc::new(OccurrenceSet::Restricted(species)));
        self
    }

    /// A filter that never restricts; used when neither a location model nor
    /// a species list is configured.
    pub fn universal() -> Self {
        Self::new(None, 0.0)
    }

    /// Produce the allowed species set for a recording's location and date.
    ///
    /// Missing location yields the permissive default (the static list if one
    /// was configured, otherwise the universal set). A location without a
    /// date restricts by location only.
    pub fn restrict(
        &self,
        lat: Option<f64>,
        lon: Option<f64>,
        date: Option<NaiveDate>,
    ) -> Arc<OccurrenceSet> {
        let (Some(lat), Some(lon)) = (lat, lon) else {
            return self.fallback();
        };

        let week = date.map(week_from_date);
        let key = OccurrenceKey::new(lat, lon, week);

        if let Ok(cache) = self.cache.lock()
            && let Some(set) = cache.get(&key)
        {
            debug!("Occurrence cache hit for ({lat:.2}, {lon:.2}, week {week:?})");
            return Arc::clone(set);
        }

        let set = self.compute(lat, lon, week);

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, Arc::clone(&set));
        }

        set
    }

    /// Query the occurrence model, falling back to the permissive set on any
    /// failure (non-fatal by design).
    fn compute(&self, lat: f64, lon: f64, week: Option<u32>) -> Arc<OccurrenceSet> {
        let Some(model) = self.model.as_ref() else {
            warn!(
                "No occurrence model available; location ({lat:.2}, {lon:.2}) not used for filtering"
            );
            return self.fallback();
        };

        // Without a date, union the four season midpoints to approximate a
        // year-round species set for the location.
        let weeks: Vec<u32> = week.map_or_else(|| SEASON_MIDPOINT_WEEKS.to_vec(), |w| vec![w]);

        let mut allowed = HashSet::new();
        for w in weeks {
            match model.predict_week(lat, lon, w) {
                Ok(scores) => {
                    allowed.extend(
                        scores
                            .into_iter()
                            .filter(|(_, score)| *score >= self.threshold)
                            .map(|(label, _)| label),
                    );
                }
                Err(e) => {
                    warn!("Occurrence prediction failed ({e}); using unrestricted species set");
                    return self.fallback();
                }
            }
        }

        debug!(
            "Occurrence filter: {} species allowed at ({lat:.2}, {lon:.2}), week {week:?}",
            allowed.len()
        );
        Arc::new(OccurrenceSet::Restricted(allowed))
    }

    fn fallback(&self) -> Arc<OccurrenceSet> {
        self.static_list
            .as_ref()
            .map_or_else(|| Arc::new(OccurrenceSet::Universal), Arc::clone)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingModel {
        calls: AtomicUsize,
    }

    impl OccurrenceModel for CountingModel {
        fn predict_week(&self, _lat: f64, _lon: f64, week: u32) -> Result<Vec<(String, f32)>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                ("Parus major_Great Tit".to_string(), 0.9),
                (format!("Weekbird {week}_Weekbird"), 0.5),
                ("Turdus merula_Blackbird".to_string(), 0.01),
            ])
        }
    }

    struct FailingModel;

    impl OccurrenceModel for FailingModel {
        fn predict_week(&self, _lat: f64, _lon: f64, _week: u32) -> Result<Vec<(String, f32)>> {
            Err(Error::OccurrencePredict {
                reason: "model file corrupt".to_string(),
            })
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_restrict_without_location_is_universal() {
        let filter = OccurrenceFilter::universal();
        let set = filter.restrict(None, None, Some(date(2025, 6, 1)));
        assert!(set.is_universal());
    }

    #[test]
    fn test_restrict_filters_by_threshold() {
        let model = Arc::new(CountingModel {
            calls: AtomicUsize::new(0),
        });
        let filter = OccurrenceFilter::new(Some(model), 0.03);
        let set = filter.restrict(Some(60.2), Some(24.9), Some(date(2025, 6, 1)));

        assert!(set.contains("Parus major_Great Tit"));
        // Below threshold 0.03
        assert!(!set.contains("Turdus merula_Blackbird"));
    }

    #[test]
    fn test_restrict_caches_per_location_and_week() {
        let model = Arc::new(CountingModel {
            calls: AtomicUsize::new(0),
        });
        let filter = OccurrenceFilter::new(Some(Arc::clone(&model) as _), 0.0);

        // May 30 and June 1 fall in the same 48-week bucket
        assert_eq!(
            week_from_date(date(2025, 5, 30)),
            week_from_date(date(2025, 6, 1))
        );

        // Same rounded location and week: one model call
        filter.restrict(Some(60.2001), Some(24.9001), Some(date(2025, 5, 30)));
        filter.restrict(Some(60.2003), Some(24.8999), Some(date(2025, 6, 1)));
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);

        // Different week: new computation
        filter.restrict(Some(60.2), Some(24.9), Some(date(2025, 12, 1)));
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_restrict_without_date_unions_seasons() {
        let model = Arc::new(CountingModel {
            calls: AtomicUsize::new(0),
        });
        let filter = OccurrenceFilter::new(Some(Arc::clone(&model) as _), 0.0);

        let set = filter.restrict(Some(60.2), Some(24.9), None);
        assert_eq!(model.calls.load(Ordering::SeqCst), 4);
        for week in SEASON_MIDPOINT_WEEKS {
            assert!(set.contains(&format!("Weekbird {week}_Weekbird")));
        }
    }

    #[test]
    fn test_model_failure_falls_back_to_universal() {
        let filter = OccurrenceFilter::new(Some(Arc::new(FailingModel)), 0.03);
        let set = filter.restrict(Some(60.2), Some(24.9), Some(date(2025, 6, 1)));
        assert!(set.is_universal());
    }

    #[test]
    fn test_static_list_used_without_location() {
        let species: HashSet<String> = ["Parus major_Great Tit".to_string()].into();
        let filter = OccurrenceFilter::universal().with_static_list(species);

        let set = filter.restrict(None, None, None);
        assert!(set.contains("Parus major_Great Tit"));
        assert!(!set.contains("Turdus merula_Blackbird"));
    }
}
