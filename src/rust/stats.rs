//! Counts and percentages summarising one classification run.

use log::debug;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::results::PetResults;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatsError {
    #[error("Cannot compute statistics: no images were classified")]
    InvalidInput,
    #[error("Statistic '{0}' is missing")]
    MissingStatistic(Statistic),
}

/// Every statistic a run produces. Declaration order is the order used for
/// printing and for the persisted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Statistic {
    NImages,
    NDogsImg,
    NNotdogsImg,
    NMatch,
    NCorrectDogs,
    NCorrectNotdogs,
    NCorrectBreed,
    PctMatch,
    PctCorrectDogs,
    PctCorrectBreed,
    PctCorrectNotdogs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    Count,
    Percentage,
}

impl Statistic {
    pub const ALL: [Statistic; 11] = [
        Statistic::NImages,
        Statistic::NDogsImg,
        Statistic::NNotdogsImg,
        Statistic::NMatch,
        Statistic::NCorrectDogs,
        Statistic::NCorrectNotdogs,
        Statistic::NCorrectBreed,
        Statistic::PctMatch,
        Statistic::PctCorrectDogs,
        Statistic::PctCorrectBreed,
        Statistic::PctCorrectNotdogs,
    ];

    /// The percentage statistics, in report order.
    pub const PERCENTAGES: [Statistic; 4] = [
        Statistic::PctMatch,
        Statistic::PctCorrectDogs,
        Statistic::PctCorrectBreed,
        Statistic::PctCorrectNotdogs,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::NImages => "n_images",
            Self::NDogsImg => "n_dogs_img",
            Self::NNotdogsImg => "n_notdogs_img",
            Self::NMatch => "n_match",
            Self::NCorrectDogs => "n_correct_dogs",
            Self::NCorrectNotdogs => "n_correct_notdogs",
            Self::NCorrectBreed => "n_correct_breed",
            Self::PctMatch => "pct_match",
            Self::PctCorrectDogs => "pct_correct_dogs",
            Self::PctCorrectBreed => "pct_correct_breed",
            Self::PctCorrectNotdogs => "pct_correct_notdogs",
        }
    }

    pub fn kind(&self) -> StatKind {
        if Self::PERCENTAGES.contains(self) {
            StatKind::Percentage
        } else {
            StatKind::Count
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Statistic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stat| stat.name() == s)
            .ok_or_else(|| format!("Unknown statistic '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatValue {
    Count(usize),
    Percentage(f64),
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{}", n),
            Self::Percentage(p) => write!(f, "{:.2}", p),
        }
    }
}

/// Statistic → value, iterated in [`Statistic`] declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregateStats {
    values: BTreeMap<Statistic, StatValue>,
}

impl AggregateStats {
    pub fn get(&self, stat: Statistic) -> Option<StatValue> {
        self.values.get(&stat).copied()
    }

    pub fn require(&self, stat: Statistic) -> Result<StatValue, StatsError> {
        self.get(stat).ok_or(StatsError::MissingStatistic(stat))
    }

    /// The value of a count statistic. A percentage stored under a count
    /// name is treated as missing.
    pub fn count(&self, stat: Statistic) -> Result<usize, StatsError> {
        match self.require(stat)? {
            StatValue::Count(n) => Ok(n),
            StatValue::Percentage(_) => Err(StatsError::MissingStatistic(stat)),
        }
    }

    /// The value of a percentage statistic. A count stored under a percentage
    /// name is treated as missing.
    pub fn percentage(&self, stat: Statistic) -> Result<f64, StatsError> {
        match self.require(stat)? {
            StatValue::Percentage(value) => Ok(value),
            StatValue::Count(_) => Err(StatsError::MissingStatistic(stat)),
        }
    }

    pub fn insert(&mut self, stat: Statistic, value: StatValue) -> Option<StatValue> {
        self.values.insert(stat, value)
    }

    pub fn remove(&mut self, stat: Statistic) -> Option<StatValue> {
        self.values.remove(&stat)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Statistic, StatValue)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(Statistic, StatValue)> for AggregateStats {
    fn from_iter<I: IntoIterator<Item = (Statistic, StatValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// `100 * part / whole`, or 100.0 when there is nothing to get wrong.
fn percentage(part: usize, whole: usize, stat: Statistic) -> f64 {
    if whole == 0 {
        debug!("{} has a zero denominator, reporting 100.0", stat);
        return 100.0;
    }
    100.0 * part as f64 / whole as f64
}

/// Reduces the per-image results to counts and percentages.
///
/// # Errors
/// `StatsError::InvalidInput` if `results` is empty.
pub fn calculate_results_stats(results: &PetResults) -> Result<AggregateStats, StatsError> {
    if results.is_empty() {
        return Err(StatsError::InvalidInput);
    }

    let n_images = results.len();
    let mut n_dogs_img = 0;
    let mut n_match = 0;
    let mut n_correct_dogs = 0;
    let mut n_correct_notdogs = 0;
    let mut n_correct_breed = 0;

    for result in results.values() {
        if result.is_match() {
            n_match += 1;
        }
        match (result.pet_is_dog(), result.classifier_is_dog()) {
            (true, true) => {
                n_dogs_img += 1;
                n_correct_dogs += 1;
                if result.is_match() {
                    n_correct_breed += 1;
                }
            }
            (true, false) => n_dogs_img += 1,
            (false, false) => n_correct_notdogs += 1,
            (false, true) => {}
        }
    }
    let n_notdogs_img = n_images - n_dogs_img;

    let stats: AggregateStats = [
        (Statistic::NImages, StatValue::Count(n_images)),
        (Statistic::NDogsImg, StatValue::Count(n_dogs_img)),
        (Statistic::NNotdogsImg, StatValue::Count(n_notdogs_img)),
        (Statistic::NMatch, StatValue::Count(n_match)),
        (Statistic::NCorrectDogs, StatValue::Count(n_correct_dogs)),
        (Statistic::NCorrectNotdogs, StatValue::Count(n_correct_notdogs)),
        (Statistic::NCorrectBreed, StatValue::Count(n_correct_breed)),
        (
            Statistic::PctMatch,
            StatValue::Percentage(percentage(n_match, n_images, Statistic::PctMatch)),
        ),
        (
            Statistic::PctCorrectDogs,
            StatValue::Percentage(percentage(n_correct_dogs, n_dogs_img, Statistic::PctCorrectDogs)),
        ),
        (
            Statistic::PctCorrectBreed,
            StatValue::Percentage(percentage(n_correct_breed, n_dogs_img, Statistic::PctCorrectBreed)),
        ),
        (
            Statistic::PctCorrectNotdogs,
            StatValue::Percentage(percentage(n_correct_notdogs, n_notdogs_img, Statistic::PctCorrectNotdogs)),
        ),
    ]
    .into_iter()
    .collect();

    Ok(stats)
}
