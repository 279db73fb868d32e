use anyhow::{Context, Result};
use clap::Parser;
use dissect::container;
use dissect::reader::Y8S1;
use log::{error, info};
use memchr::memmem;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::exit;

#[derive(Parser, Debug)]
#[command(
    version = "0.2",
    about = "Decompresses a replay and writes an annotated hex dump of the payload,
sectioned by game-clock ticks. Purely for format debugging.",
    help_template = "\
{name} {version}
{about}

USAGE:
    {usage}

OPTIONS:
    {options}
"
)]
struct Args {
    /// Path to the replay file.
    #[arg(short, long)]
    replay: PathBuf,

    /// Output file for the dump.
    #[arg(short, long, default_value = "payload.dump")]
    out: PathBuf,
}

const TIME_MODERN: [u8; 4] = [0x1F, 0x07, 0xEF, 0xC9];
const TIME_LEGACY: [u8; 4] = [0x1E, 0xF1, 0x11, 0xAB];
const USERNAME_TRACE: [u8; 5] = [0x22, 0x07, 0x94, 0x9B, 0xDC];

fn hex_upper(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        use std::fmt::Write as _;
        let _ = write!(s, "{b:02X}");
    }
    s
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("{e:#}");
        exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let data = fs::read(&args.replay)
        .with_context(|| format!("could not read replay {:?}", args.replay))?;
    let c = container::open(&data).context("could not open replay container")?;
    info!(
        "decompressed {} payload bytes ({}/{})",
        c.payload.len(),
        c.header.game_version,
        c.header.code_version
    );

    let time_sig: &[u8] = if c.header.code_version >= Y8S1 {
        &TIME_MODERN
    } else {
        &TIME_LEGACY
    };
    let clocks = clock_sections(&c.payload, time_sig, c.header.code_version >= Y8S1);
    let players = harvest_packet_ids(&c.payload);
    info!("{} clock ticks, {} packet-ids", clocks.len(), players.len());

    let mut w = BufWriter::new(
        File::create(&args.out).with_context(|| format!("could not create {:?}", args.out))?,
    );
    writeln!(w, "start:\n---------------")?;

    // hex lines split on runs of four zero bytes, like the payload itself
    // pads records; annotate line tails that resolve to a known packet-id
    let mut line = String::new();
    let mut zeros = 0;
    for (i, b) in c.payload.iter().enumerate() {
        if let Some(t) = clocks.get(&i) {
            writeln!(w, "\n\n{t}:\n---------------")?;
        }
        line.push_str(&hex_upper(&[*b]));
        zeros = if *b == 0x00 { zeros + 1 } else { 0 };
        if zeros == 4 {
            flush_line(&mut w, &mut line, &players)?;
            zeros = 0;
        }
    }
    flush_line(&mut w, &mut line, &players)?;
    info!("dump written to {:?}", args.out);
    Ok(())
}

fn flush_line<W: Write>(
    w: &mut W,
    line: &mut String,
    players: &HashMap<String, String>,
) -> Result<()> {
    let trimmed = line.trim_end_matches('0');
    if trimmed.is_empty() {
        line.clear();
        return Ok(());
    }
    let mut out = trimmed.to_owned();
    if out.len() % 2 != 0 {
        out.push('0');
    }
    if out.len() > 8 {
        if let Some(username) = players.get(&out[out.len() - 8..]) {
            out.push_str(" - ");
            out.push_str(username);
        }
    }
    writeln!(w, "{out}")?;
    line.clear();
    Ok(())
}

/// Positions of clock-tick signatures mapped to their formatted time.
fn clock_sections(payload: &[u8], sig: &[u8], binary: bool) -> HashMap<usize, String> {
    let mut out = HashMap::new();
    for pos in memmem::find_iter(payload, sig) {
        let p = pos + sig.len();
        if binary {
            if p + 5 <= payload.len() {
                let mut le = [0u8; 4];
                le.copy_from_slice(&payload[p + 1..p + 5]);
                let seconds = u32::from_le_bytes(le);
                out.insert(pos, format!("{}:{:02}", seconds / 60, seconds % 60));
            }
        } else if p < payload.len() {
            let len = payload[p] as usize;
            if p + 1 + len <= payload.len() {
                out.insert(
                    pos,
                    String::from_utf8_lossy(&payload[p + 1..p + 1 + len]).into_owned(),
                );
            }
        }
    }
    out
}

/// Player descriptors carry a username near the front and the packet-id 67
/// bytes later; enough to label dump lines.
fn harvest_packet_ids(payload: &[u8]) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for pos in memmem::find_iter(payload, &USERNAME_TRACE) {
        let p = pos + USERNAME_TRACE.len();
        if p >= payload.len() {
            continue;
        }
        let len = payload[p] as usize;
        let id_at = p + 1 + len + 67;
        if id_at + 4 > payload.len() {
            continue;
        }
        let username = String::from_utf8_lossy(&payload[p + 1..p + 1 + len]).into_owned();
        if username.is_empty() {
            continue;
        }
        out.insert(hex_upper(&payload[id_at..id_at + 4]), username);
    }
    out
}
