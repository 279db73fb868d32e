use anyhow::{Context, Result};
use clap::Parser;
use dissect::matches::{MatchReader, RoundData};
use dissect::RoundReader;
use log::{error, info};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::exit;

#[derive(Parser, Debug)]
#[command(
    version = "0.5",
    about = "A CLI utility to decode match replays: header, match feed, round outcome, and player statistics.
Accepts a single round (.rec) or a match directory of rounds.",
    help_template = "\
{name} {version}
{about}

USAGE:
    {usage}

EXAMPLES:
    ./parse_replay -r ./Match-2023-04-02/Match-R01.rec
    ./parse_replay -r ./Match-2023-04-02 --json match.json

OPTIONS:
    {options}
"
)]
struct Args {
    /// Path to a .rec file or to a match directory.
    #[arg(short, long)]
    replay: PathBuf,

    /// Write decoded output as JSON to this path ("-" for stdout).
    #[arg(short, long)]
    json: Option<PathBuf>,

    /// Stop after the roster (no feed, no outcome). Faster.
    #[arg(long, default_value_t = false)]
    partial: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let result = if args.replay.is_dir() {
        run_match(&args)
    } else {
        run_round(&args)
    };

    if let Err(e) = result {
        error!("{e:#}");
        exit(1);
    }
}

fn run_round(args: &Args) -> Result<()> {
    let mut r = RoundReader::from_file(&args.replay)
        .with_context(|| format!("could not open replay {:?}", args.replay))?;
    print!("{}", r.header);
    if args.partial {
        r.read_partial().context("partial read failed")?;
    } else {
        r.read().context("replay read failed")?;
        for (i, team) in r.header.teams.iter().enumerate() {
            if let (true, Some(condition)) = (team.won, team.win_condition) {
                info!("Winner: {} [{}] by {condition:?}", team.name, i);
            }
        }
        info!("{} feed entries", r.match_feedback.len());
    }
    if let Some(path) = &args.json {
        let data = RoundData {
            header: &r.header,
            match_feedback: &r.match_feedback,
            stats: r.player_stats(),
        };
        write_json(path, &serde_json::to_vec(&data)?)?;
    }
    Ok(())
}

fn run_match(args: &Args) -> Result<()> {
    let mut m = MatchReader::new(&args.replay)
        .with_context(|| format!("could not open match directory {:?}", args.replay))?;
    info!("{} rounds", m.num_rounds());
    if let Some(first) = m.first_round() {
        print!("{}", first.header);
    }
    if !args.partial {
        m.read_all().context("match read failed")?;
    }
    if let Some(path) = &args.json {
        write_json(path, &serde_json::to_vec(&m.data())?)?;
    }
    Ok(())
}

fn write_json(path: &PathBuf, bytes: &[u8]) -> Result<()> {
    if path.as_os_str() == "-" {
        io::stdout().write_all(bytes)?;
        io::stdout().write_all(b"\n")?;
    } else {
        File::create(path)
            .with_context(|| format!("could not create {path:?}"))?
            .write_all(bytes)?;
        info!("wrote {path:?}");
    }
    Ok(())
}
