use crate::error::{Error, Result};
use crate::header::{self, Header};
use crate::payload::Payload;
use log::{debug, warn};
use memchr::memmem;
use std::io::Read;

/// Chunk prefix used by recent replay versions: ASCII `00VRPMC` followed by
/// one more byte, then an independent zstd frame.
pub const CHUNK_SENTINEL: [u8; 7] = [0x30, 0x30, 0x56, 0x52, 0x50, 0x4D, 0x43];

/// How far into the file the sentinel probe looks. The uncompressed header
/// prefix of chunked files is well under this.
const PROBE_WINDOW: usize = 512 * 1024;

const DECOMPRESS_CHUNK: usize = 64 * 1024;

/// The outer container, opened: parsed header plus the fully decompressed
/// payload bytes.
#[derive(Debug)]
pub struct Container {
    pub header: Header,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// One zstd stream covering the whole file, header included.
    Legacy,
    /// Raw header prefix, then sentinel-framed zstd chunks.
    Chunked,
}

fn probe(data: &[u8]) -> Layout {
    // Legacy files are compressed from byte 0, so a raw magic can only mean
    // the chunked layout.
    if data.starts_with(b"dissect") {
        return Layout::Chunked;
    }
    let window = &data[..data.len().min(PROBE_WINDOW)];
    if memmem::find(window, &CHUNK_SENTINEL).is_some() {
        Layout::Chunked
    } else {
        Layout::Legacy
    }
}

/// Decompresses one zstd stream, tolerating trailing non-zstd bytes: an
/// error after at least one output byte ends the stream cleanly.
fn decompress_tolerant(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = zstd::stream::read::Decoder::new(data).map_err(|_| Error::InvalidFile)?;
    let mut out = Vec::new();
    let mut buf = [0u8; DECOMPRESS_CHUNK];
    loop {
        match decoder.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => out.extend_from_slice(&buf[..n]),
            Err(e) => {
                if out.is_empty() {
                    return Err(Error::InvalidFile);
                }
                debug!("treating decompression error as end of stream: {e}");
                break;
            }
        }
    }
    Ok(out)
}

fn decompress_frame(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = zstd::stream::read::Decoder::new(data)?.single_frame();
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Opens a replay: probes the container layout, parses the header, and
/// returns it together with the decompressed payload.
pub fn open(data: &[u8]) -> Result<Container> {
    match probe(data) {
        Layout::Legacy => {
            let decompressed = decompress_tolerant(data)?;
            let mut cur = Payload::new(decompressed);
            header::read_magic(&mut cur)?;
            let header = header::read_header(&mut cur)?;
            let payload = cur.data()[cur.pos()..].to_vec();
            Ok(Container { header, payload })
        }
        Layout::Chunked => {
            let mut cur = Payload::new(data.to_vec());
            header::read_magic(&mut cur)?;
            let header = header::read_header(&mut cur)?;
            let payload = read_chunks(data, cur.pos())?;
            Ok(Container { header, payload })
        }
    }
}

/// Concatenates the outputs of every sentinel-prefixed zstd frame starting
/// at `from`. A chunk that fails to decode marks the trailing remnant and
/// ends the payload cleanly.
fn read_chunks(data: &[u8], from: usize) -> Result<Vec<u8>> {
    let starts: Vec<usize> = memmem::find_iter(&data[from..], &CHUNK_SENTINEL)
        .map(|i| from + i)
        .collect();
    if starts.is_empty() {
        warn!("chunked replay without a single chunk after the header");
        return Ok(Vec::new());
    }
    let mut payload = Vec::new();
    for (i, start) in starts.iter().enumerate() {
        let frame_start = start + CHUNK_SENTINEL.len() + 1;
        let frame_end = starts.get(i + 1).copied().unwrap_or(data.len());
        if frame_start >= frame_end {
            debug!("empty chunk at {start}, stopping");
            break;
        }
        match decompress_frame(&data[frame_start..frame_end]) {
            Ok(out) => payload.extend_from_slice(&out),
            Err(e) => {
                // .rec files carry non-zstd bytes past the last chunk.
                debug!("chunk {i} did not decode ({e}), treating as end of stream");
                break;
            }
        }
    }
    Ok(payload)
}
