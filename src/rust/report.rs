//! Console rendering of a run's statistics and misclassifications.

use std::io::{self, Write};
use std::time::Duration;

use crate::results::PetResults;
use crate::stats::{AggregateStats, StatValue, Statistic, StatsError};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Cannot print results: {0}")]
    Stats(#[from] StatsError),
    #[error("Failed to write report: {0}")]
    Io(#[from] io::Error),
}

/// Which optional listings to append to the summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    pub print_incorrect_dogs: bool,
    pub print_incorrect_breed: bool,
}

/// Writes the results summary for one architecture to `out`.
///
/// Every statistic the report needs is looked up before the first byte is
/// written, so a missing statistic never leaves a half-printed report.
pub fn write_results<W: Write>(
    out: &mut W,
    results: &PetResults,
    stats: &AggregateStats,
    architecture: &str,
    options: ReportOptions,
) -> Result<(), ReportError> {
    let n_images = stats.count(Statistic::NImages)?;
    let n_dogs_img = stats.count(Statistic::NDogsImg)?;
    let n_notdogs_img = stats.count(Statistic::NNotdogsImg)?;
    let n_correct_dogs = stats.count(Statistic::NCorrectDogs)?;
    let n_correct_notdogs = stats.count(Statistic::NCorrectNotdogs)?;
    let n_correct_breed = stats.count(Statistic::NCorrectBreed)?;
    let percentages = Statistic::PERCENTAGES
        .iter()
        .map(|&stat| stats.percentage(stat).map(|value| (stat, value)))
        .collect::<Result<Vec<_>, _>>()?;

    writeln!(out, "Results for architecture: {}", architecture)?;
    writeln!(out, "-------------------------------")?;
    writeln!(out, "Number of Images: {}", n_images)?;
    writeln!(out, "Number of Dog Images: {}", n_dogs_img)?;
    writeln!(out, "Number of \"Not-a\" Dog Images: {}", n_notdogs_img)?;
    for (stat, value) in percentages {
        writeln!(out, "{}: {}", stat, StatValue::Percentage(value))?;
    }

    if options.print_incorrect_dogs && n_correct_dogs + n_correct_notdogs != n_images {
        writeln!(out)?;
        writeln!(out, "INCORRECT Dog/NOT Dog Assignments:")?;
        for (filename, result) in results.iter().filter(|(_, r)| r.is_dog_misclassified()) {
            write_misclassified(out, filename, result.classifier_label())?;
        }
    }

    if options.print_incorrect_breed && n_correct_dogs != n_correct_breed {
        writeln!(out)?;
        writeln!(out, "INCORRECT Dog Breed Assignment:")?;
        for (filename, result) in results.iter().filter(|(_, r)| r.is_breed_misclassified()) {
            write_misclassified(out, filename, result.classifier_label())?;
        }
    }

    Ok(())
}

fn write_misclassified<W: Write>(out: &mut W, filename: &str, predicted: &str) -> io::Result<()> {
    writeln!(out, "Image {} classified incorrectly as {}", filename, predicted)
}

/// [`write_results`] to stdout.
pub fn print_results(
    results: &PetResults,
    stats: &AggregateStats,
    architecture: &str,
    options: ReportOptions,
) -> Result<(), ReportError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_results(&mut out, results, stats, architecture, options)
}

/// Writes the one-row comparison table printed at the end of a run.
pub fn write_summary_table<W: Write>(
    out: &mut W,
    stats: &AggregateStats,
    architecture: &str,
) -> Result<(), ReportError> {
    let notdogs = stats.percentage(Statistic::PctCorrectNotdogs)?;
    let dogs = stats.percentage(Statistic::PctCorrectDogs)?;
    let breed = stats.percentage(Statistic::PctCorrectBreed)?;
    let label = stats.percentage(Statistic::PctMatch)?;

    writeln!(out, "\n\n****** FINAL RESULTS *******\n\n")?;
    writeln!(out, "{:<19}{:>8}{:>10}{:>10}{:>10}", "Architecture", "~Dog", "Dog", "Breed", "Label")?;
    writeln!(
        out,
        "{:<19}{:>8.2}{:>10.2}{:>10.2}{:>10.2}",
        architecture, notdogs, dogs, breed, label
    )?;
    writeln!(out, "\n\n*******************************")?;
    Ok(())
}

/// Renders a duration as `H:M:S` with whole, unpadded fields.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}:{}:{}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
