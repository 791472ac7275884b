use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::Parser;
use phrase_check::{
    drive, Action, AttemptTicket, BackupCheck, ChallengeRandom, ChipId, FlowConfig, FlowHost,
    MnemonicStrength, RngChallenge, SecureMnemonic, Stage,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

const USAGE: &str =
    "commands: <chip> <group> | release <group> | retry | replay | start | proceed | quit";

#[derive(Parser)]
#[command(name = "phrase-check", about = "Practice the recovery phrase backup check")]
struct Cli {
    /// Length of a freshly generated phrase
    #[arg(long, default_value_t = 24)]
    words: usize,
    /// Check an existing phrase instead of generating one
    #[arg(long)]
    phrase: Option<String>,
    /// Seed for missing words and chip order, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
    /// Flow config as JSON
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Sleeps through the outcome delay on the terminal.
#[derive(Default)]
struct TerminalHost {
    due: Option<(AttemptTicket, Duration)>,
    exited: bool,
}

impl FlowHost for TerminalHost {
    fn schedule_transition(&mut self, ticket: AttemptTicket, delay: Duration) {
        self.due = Some((ticket, delay));
    }

    fn on_failure_feedback_requested(&mut self) {
        print!("\x07");
        if let Err(err) = io::stdout().flush() {
            warn!(%err, "terminal bell not flushed");
        }
    }

    fn on_succeeded(&mut self) {
        println!("\n✅ Backup verified. Type 'proceed' to finish or 'replay' to go again.");
    }

    fn on_failed(&mut self) {
        println!("\n❌ That is not your phrase. Type 'retry' for a new round.");
    }

    fn on_exited(&mut self) {
        self.exited = true;
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => FlowConfig::from_json(&fs::read_to_string(path)?)?,
        None => FlowConfig::default(),
    };

    let mnemonic = match &cli.phrase {
        Some(phrase) => SecureMnemonic::from_phrase(phrase)?,
        None => {
            let strength = MnemonicStrength::from_word_count(cli.words)
                .ok_or_else(|| format!("no mnemonic has {} words", cli.words))?;
            SecureMnemonic::generate(strength)?
        }
    };
    let phrase = mnemonic.recovery_phrase(config.group_count)?;

    println!("Recovery Phrase Backup Check");
    println!("============================");
    println!("\n⚠️  Write these words down, then press Enter.\n");
    for (g, group) in phrase.groups().enumerate() {
        let start = g * phrase.group_len();
        let line: Vec<String> = group
            .iter()
            .enumerate()
            .map(|(i, w)| format!("{:2}. {:12}", start + i + 1, w))
            .collect();
        println!("  {}", line.join(""));
    }
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    lines.next().transpose()?;
    // push the phrase off screen
    print!("\x1b[2J\x1b[H");

    let random = match cli.seed {
        Some(seed) => RngChallenge::seeded(seed),
        None => RngChallenge::from_entropy(),
    };
    let mut check = BackupCheck::new(config, random);
    let mut host = TerminalHost::default();
    check.start_validation(phrase)?;

    loop {
        if check.stage() == Stage::Validating {
            show(&check);
        }
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next().transpose()? else {
            break;
        };
        let Some(action) = parse_action(&line) else {
            println!("{}", USAGE);
            continue;
        };
        let leaving = action == Action::Leave;
        if let Err(err) = drive(&mut check, &mut host, action) {
            println!("{}", err);
            continue;
        }

        if let Some((ticket, delay)) = host.due.take() {
            thread::sleep(delay);
            drive(&mut check, &mut host, Action::TransitionDue(ticket))?;
        }
        if host.exited || leaving {
            break;
        }
    }

    Ok(())
}

fn show<R: ChallengeRandom>(check: &BackupCheck<R>) {
    let Some(attempt) = check.state().attempt() else {
        return;
    };
    let challenge = attempt.challenge();

    println!();
    for (g, group) in challenge.blanked_groups().iter().enumerate() {
        let line: Vec<String> = group
            .iter()
            .map(|w| match w {
                Some(word) => format!("{:12}", word),
                None => format!("[{:10}]", attempt.placed_word(g).unwrap_or("")),
            })
            .collect();
        println!("  group {}: {}", g, line.join(" "));
    }
    let chips: Vec<String> = attempt
        .unassigned_chips()
        .map(|c| format!("{} {}", c.id(), c.word()))
        .collect();
    println!("  chips: {}", chips.join("   "));
}

fn parse_action(line: &str) -> Option<Action> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        ["retry"] => Some(Action::Retry),
        ["replay"] => Some(Action::Replay),
        ["start"] => Some(Action::Start),
        ["proceed"] => Some(Action::Proceed),
        ["quit"] => Some(Action::Leave),
        ["release", group] => Some(Action::Release {
            group: group.parse().ok()?,
        }),
        [chip, group] => Some(Action::Assign {
            chip: ChipId(chip.trim_start_matches('#').parse().ok()?),
            group: group.parse().ok()?,
        }),
        _ => None,
    }
}
