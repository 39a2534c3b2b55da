//! A simple CLI tool for auditing a ballot ledger.
//! This replays the journal with the same rules the server enforces, so any
//! dump the server publishes can be checked independently.

use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::BufReader;

use clap::{Arg, ArgAction, ArgMatches, Command};
use rocket::serde::json::serde_json;

use ballot_ledger::model::api::{DumpError, LedgerDump};
use ledger_core::{CandidateId, ElectionError, JournalError, Ledger};

const PROGRAM_NAME: &str = "ledger-audit";

const ABOUT_TEXT: &str = "Audit the journal of a ballot ledger.

EXIT CODES:
     0: Audit succeeded.
   255: Ran successfully, but the ledger failed the audit.
 Other: Error.";

const DUMP_PATH: &str = "DUMP_PATH";

const DUMP_PATH_HELP: &str = "The path to a JSON dump of the ledger,\n\
as returned by `GET /ledger/dump`";

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME).about(ABOUT_TEXT).arg(
        Arg::new(DUMP_PATH)
            .help(DUMP_PATH_HELP)
            .action(ArgAction::Set)
            .required(true),
    )
}

/// Errors that this program may produce.
#[derive(Debug, Eq, PartialEq)]
enum Error {
    /// IO error described by the inner message.
    IO(String),
    /// Failed to decode the JSON dump.
    Format(String),
    /// The dump failed the audit for the contained reason.
    Audit(DumpError),
}

/// One candidate's standing, as printed.
#[derive(Debug, Eq, PartialEq)]
struct Tally {
    pub candidate_id: CandidateId,
    pub name: String,
    pub votes: u64,
}

impl Display for Tally {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} {}: {} vote{}",
            self.candidate_id,
            self.name,
            self.votes,
            if self.votes != 1 { "s" } else { "" }
        )
    }
}

/// The outcome of a successful audit.
#[derive(Debug, Eq, PartialEq)]
struct Report {
    pub round: u32,
    pub active: bool,
    pub entries: usize,
    pub tallies: Vec<Tally>,
    pub winner: Result<CandidateId, ElectionError>,
}

impl Report {
    fn new(ledger: &Ledger, entries: usize) -> Self {
        let mut tallies: Vec<Tally> = ledger
            .candidates()
            .map(|c| Tally {
                candidate_id: c.id,
                name: c.name.clone(),
                votes: c.vote_count,
            })
            .collect();
        // Most votes first; ties keep admission order.
        tallies.sort_by(|a, b| b.votes.cmp(&a.votes));

        Self {
            round: ledger.round(),
            active: ledger.election_status().is_active(),
            entries,
            tallies,
            winner: ledger.winner().map(|c| c.id),
        }
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Round {} ({}), {} journal entr{}.",
            self.round,
            if self.active { "voting open" } else { "voting closed" },
            self.entries,
            if self.entries != 1 { "ies" } else { "y" }
        )?;
        for tally in &self.tallies {
            writeln!(f, "{tally}")?;
        }
        match self.winner {
            Ok(id) => write!(f, "Winner: candidate #{id}"),
            Err(e) => write!(f, "No winner: {e}"),
        }
    }
}

/// Load and audit a dump.
fn audit(path: &str) -> Result<Report, Error> {
    // Load the file.
    let file = BufReader::new(File::open(path).map_err(|e| Error::IO(e.to_string()))?);
    let dump: LedgerDump =
        serde_json::from_reader(file).map_err(|e| Error::Format(e.to_string()))?;

    // Replay and compare.
    dump.verify().map_err(Error::Audit)?;

    Ok(Report::new(&dump.ledger, dump.journal.len()))
}

fn describe(err: &DumpError) -> String {
    match err {
        DumpError::Journal(JournalError::Rejected { seq, error }) => {
            format!("Entry {seq} records an illegal action: {error}.")
        }
        DumpError::Journal(JournalError::Forged { seq }) => {
            format!("Entry {seq} does not match what its action would have produced.")
        }
        DumpError::Journal(err) => format!("The journal is corrupt: {err}."),
        DumpError::Mismatch => String::from(
            "The journal is intact, but does not produce \
            the published ledger.",
        ),
        DumpError::Invariant(msg) => format!("The published ledger is inconsistent: {msg}."),
    }
}

/// Run the audit, report the result, and return the exit code.
fn run(args: &ArgMatches) -> u8 {
    let path: &String = match args.get_one(DUMP_PATH) {
        Some(path) => path,
        None => return 1,
    };
    match audit(path) {
        Ok(report) => {
            println!("Audit succeeded.");
            println!("{report}");
            0
        }
        Err(Error::IO(msg)) => {
            println!("IO error: {msg}");
            1
        }
        Err(Error::Format(msg)) => {
            println!("Invalid JSON: {msg}");
            1
        }
        Err(Error::Audit(err)) => {
            println!("Audit failed: {}", describe(&err));
            255
        }
    }
}

fn main() {
    let args = cli().get_matches();
    let exit_code = run(&args);
    std::process::exit(exit_code.into())
}
