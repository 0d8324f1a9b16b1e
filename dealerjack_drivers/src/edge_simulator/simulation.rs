use std::time::Instant;

use dealerjack::simulation::hand::Hand;
use dealerjack::simulation::shoe::Shoe;
use dealerjack::simulation::{Card, Outcome, RoundResult, Simulator, SimulatorEventHandler};
use dealerjack::Decision;
use dealerjack_drivers::Config;

use crate::report;

/// Prints every hand as it plays out. Only sensible for a handful of hands,
/// so the driver runs it on a separate single-threaded simulator ahead of
/// the bulk run.
#[derive(Debug, Default)]
struct TracingHandler {
    hand_id: u64,
    decisions: Vec<Vec<String>>,
    dealer_decisions: Vec<String>,
}

impl SimulatorEventHandler for TracingHandler {
    fn on_hand_begin(&mut self, shoe: &Shoe) {
        self.hand_id += 1;
        self.decisions.clear();
        self.dealer_decisions.clear();
        println!("Hand #{} ({} cards in shoe)", self.hand_id, shoe.remaining());
    }

    fn on_deal(&mut self, player_hands: &[Hand], dealer_hand: &Hand) {
        for (seat, hand) in player_hands.iter().enumerate() {
            print!("Seat {} cards:", seat);
            for card in hand.cards() {
                print!(" {}", card);
            }
            println!();
        }
        let upcard: &Card = &dealer_hand.cards()[0];
        println!("Dealer upcard: {}", upcard);
    }

    fn on_player_decision(&mut self, seat: usize, decision: Decision) {
        while self.decisions.len() <= seat {
            self.decisions.push(Vec::new());
        }
        self.decisions[seat].push(decision_to_string(decision));
    }

    fn on_dealer_decision(&mut self, decision: Decision) {
        self.dealer_decisions.push(decision_to_string(decision));
    }

    fn on_outcome(&mut self, outcome: &Outcome) {
        for (seat, decisions) in self.decisions.iter().enumerate() {
            print!("Seat {} decisions:", seat);
            for decision in decisions {
                print!(" {}", decision);
            }
            println!();
        }
        print!("Dealer decisions:");
        for decision in &self.dealer_decisions {
            print!(" {}", decision);
        }
        println!();
        let result = match outcome.result {
            RoundResult::PlayerWin => "player hand wins (bet loses)",
            RoundResult::DealerWin => "dealer hand wins (bet pays)",
            RoundResult::Push => "push",
        };
        println!(
            "Player {} vs dealer {}: {}",
            outcome.player.total, outcome.dealer.total, result
        );
        println!("----------------------------------------------------");
    }
}

fn decision_to_string(decision: Decision) -> String {
    match decision {
        Decision::Hit => String::from("Hit"),
        Decision::Stand => String::from("Stand"),
    }
}

/// Runs the configured simulation and writes the reports.
pub fn simulate_and_report(config: &Config) -> Result<(), String> {
    let rule: dealerjack::Rule = config
        .rule
        .clone()
        .try_into()
        .map_err(|error| format!("invalid configuration: {}", error))?;
    let profile = config.edge_simulator.run_profile();

    if config.edge_simulator.trace_hands > 0 {
        let seed = profile.seed.unwrap_or(0);
        let mut simulator = Simulator::new(&rule, seed)
            .map_err(|error| format!("invalid configuration: {}", error))?;
        let mut handler = TracingHandler::default();
        for _ in 0..config.edge_simulator.trace_hands {
            simulator.run_hand(&mut handler)?;
        }
    }

    log::info!(
        "starting bulk run of {} rounds",
        config.edge_simulator.hands_to_simulate
    );
    let started = Instant::now();
    let report = dealerjack::run_simulation(&rule, &profile)
        .map_err(|error| format!("invalid configuration: {}", error))?;
    let elapsed = started.elapsed();

    let summary = report::summary_text(&rule, &report, elapsed);
    println!("{}", summary);

    let directory = &config.edge_simulator.report_directory;
    if !directory.is_empty() {
        report::write_reports(directory, &summary, &report)
            .map_err(|error| format!("cannot write reports: {}", error))?;
        println!("Reports written to {}/", directory);
    }
    Ok(())
}
