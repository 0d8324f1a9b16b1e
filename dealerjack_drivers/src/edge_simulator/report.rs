use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::Write as _;
use std::path::Path;
use std::time::Duration;

use dealerjack::statistics::{card_bucket_label, PushCategory, TotalBucket, CARD_BUCKETS};
use dealerjack::{Rule, SimulationReport};

fn percentage(rate: f64) -> String {
    format!("{:.4}%", rate * 100.0)
}

/// The summary block printed to the console and saved alongside the CSVs.
pub fn summary_text(rule: &Rule, report: &SimulationReport, elapsed: Duration) -> String {
    let edge = &report.edge;
    let stats = &report.stats;
    let mut text = String::new();

    let mut line = |content: String| {
        let _ = writeln!(text, "{}", content);
    };
    line(String::from("Simulation results"));
    line(String::from("=================="));
    line(format!(
        "Hands: {} ({} seats, {} decks, {})",
        edge.hands,
        rule.number_of_players,
        rule.number_of_decks,
        if rule.continuous_shuffle {
            String::from("continuous shuffle")
        } else {
            format!("reshuffle at {} cards", rule.reshuffle_cutoff)
        },
    ));
    line(format!("Seed: {}", report.seed));
    line(format!("Elapsed: {:.2}s", elapsed.as_secs_f64()));
    line(String::new());
    line(format!(
        "Bet wins (dealer hand prevails):  {} ({})",
        stats.dealer_wins(),
        percentage(edge.win_rate)
    ));
    line(format!(
        "  of which dealer naturals:       {} ({})",
        stats.dealer_natural_wins(),
        percentage(edge.natural_win_rate)
    ));
    line(format!(
        "Naturals dealt: player {}, dealer {}",
        stats.player_naturals(),
        stats.dealer_naturals()
    ));
    line(format!(
        "Bet losses (player hand prevails): {} ({})",
        stats.player_wins(),
        percentage(edge.loss_rate)
    ));
    line(format!(
        "Pushes:                            {} ({})",
        stats.pushes(),
        percentage(edge.push_rate)
    ));
    line(format!(
        "Player busts: {} ({})   Dealer busts: {} ({})",
        stats.player_busts(),
        percentage(edge.player_bust_rate),
        stats.dealer_busts(),
        percentage(edge.dealer_bust_rate)
    ));
    line(String::new());
    line(format!("Raw edge:        {}", percentage(edge.raw_edge)));
    line(format!(
        "True house edge: {} (commission {}%, naturals pay {}x)",
        percentage(edge.true_house_edge),
        rule.commission_pct,
        rule.payout_blackjack
    ));
    if let Some(sidebet_edge) = edge.sidebet_edge {
        line(format!("Sidebet edge:    {}", percentage(sidebet_edge)));
    }
    text
}

/// Dealer buckets across the columns, player buckets down the rows.
pub fn outcome_matrix_csv(report: &SimulationReport) -> String {
    let matrix = report.stats.outcome_matrix();
    let mut csv = String::from("player\\dealer");
    for bucket in TotalBucket::ALL {
        let _ = write!(csv, ",{}", bucket.label());
    }
    csv.push('\n');
    for player_bucket in TotalBucket::ALL {
        let _ = write!(csv, "{}", player_bucket.label());
        for dealer_bucket in TotalBucket::ALL {
            let _ = write!(
                csv,
                ",{}",
                matrix[player_bucket.index()][dealer_bucket.index()]
            );
        }
        csv.push('\n');
    }
    csv
}

/// Card-count buckets across the columns, push categories down the rows.
pub fn push_matrix_csv(report: &SimulationReport) -> String {
    let matrix = report.stats.push_matrix();
    let mut csv = String::from("push\\cards");
    for cards in 0..CARD_BUCKETS {
        let _ = write!(csv, ",{}", card_bucket_label(cards));
    }
    csv.push('\n');
    for category in PushCategory::ALL {
        let _ = write!(csv, "{}", category.label());
        for cards in 0..CARD_BUCKETS {
            let _ = write!(csv, ",{}", matrix[category.index()][cards]);
        }
        csv.push('\n');
    }
    csv
}

/// Writes summary.txt, outcome_matrix.csv and push_matrix.csv into the
/// given directory, creating it if needed.
pub fn write_reports(
    directory: &str,
    summary: &str,
    report: &SimulationReport,
) -> std::io::Result<()> {
    let directory = Path::new(directory);
    fs::create_dir_all(directory)?;

    let mut file = File::create(directory.join("summary.txt"))?;
    write!(file, "{}", summary)?;

    let mut file = File::create(directory.join("outcome_matrix.csv"))?;
    write!(file, "{}", outcome_matrix_csv(report))?;

    let mut file = File::create(directory.join("push_matrix.csv"))?;
    write!(file, "{}", push_matrix_csv(report))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealerjack::{run_simulation, RunProfile};

    fn small_report() -> SimulationReport {
        let profile = RunProfile {
            hands_to_simulate: 200,
            number_of_threads: 1,
            seed: Some(3),
        };
        run_simulation(&Rule::default(), &profile).unwrap()
    }

    #[test]
    fn outcome_matrix_csv_is_well_formed() {
        let csv = outcome_matrix_csv(&small_report());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 9); // header plus eight player buckets
        assert!(lines[0].starts_with("player\\dealer,<=16,17,"));
        for line in &lines[1..] {
            assert_eq!(line.split(',').count(), 9);
        }
    }

    #[test]
    fn push_matrix_csv_is_well_formed() {
        let csv = push_matrix_csv(&small_report());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 8); // header plus seven categories
        assert!(lines[0].ends_with("11,12+"));
        assert!(lines[7].starts_with("natural-natural,"));
    }

    #[test]
    fn summary_mentions_the_headline_figures() {
        let report = small_report();
        let summary = summary_text(&Rule::default(), &report, Duration::from_millis(10));
        assert!(summary.contains("True house edge:"));
        assert!(summary.contains(&format!("Seed: {}", report.seed)));
        assert!(!summary.contains("Sidebet edge:"));
    }
}
