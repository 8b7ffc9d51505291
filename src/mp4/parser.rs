//! Incremental top-level box parser.
//!
//! Chunks are fed in file order with their byte offsets; the parser buffers
//! only the boxes it needs (ftyp and moov) and discards everything else,
//! notably mdat payloads, without holding them in memory. Once the movie
//! metadata has been parsed it reports ready and ignores further input.

use crate::errors::{MediaGateResult, Mp4Error};
use crate::mp4::moov::parse_moov_structure;
use crate::mp4::stsd::SampleEntry;
use crate::mp4::types::ContainerInfo;
use crate::streams::{ByteStream, MediaSource};
use std::collections::HashMap;

/// Refuse to buffer a single box past this size
const MAX_BUFFERED_BOX: u64 = 256 * 1024 * 1024;

/// Externally visible parser phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserPhase {
    /// Waiting for more input
    Accumulating,
    /// Movie metadata parsed; `into_result` yields the container
    Ready,
    /// Malformed input; `failure` carries the reason
    Failed,
}

enum ParserState {
    Accumulating,
    Ready(ParsedContainer),
    Failed(Mp4Error),
}

/// A successfully parsed container: the public metadata plus the sample
/// description entries decoder configuration draws from.
#[derive(Debug, Clone)]
pub struct ParsedContainer {
    info: ContainerInfo,
    entries: HashMap<u32, Vec<SampleEntry>>,
}

impl ParsedContainer {
    pub fn info(&self) -> &ContainerInfo {
        &self.info
    }

    pub fn into_info(self) -> ContainerInfo {
        self.info
    }

    pub(crate) fn sample_entries(&self, track_id: u32) -> &[SampleEntry] {
        self.entries.get(&track_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

pub struct ContainerParser {
    state: ParserState,
    /// Bytes of the box currently being accumulated
    pending: Vec<u8>,
    /// Remaining payload bytes of a box being discarded
    skip: u64,
    /// Expected offset of the next chunk
    next_offset: u64,
    major_brand: Option<String>,
    compatible_brands: Vec<String>,
    saw_moof: bool,
}

impl ContainerParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::Accumulating,
            pending: Vec::new(),
            skip: 0,
            next_offset: 0,
            major_brand: None,
            compatible_brands: Vec::new(),
            saw_moof: false,
        }
    }

    pub fn phase(&self) -> ParserPhase {
        match &self.state {
            ParserState::Accumulating => ParserPhase::Accumulating,
            ParserState::Ready(_) => ParserPhase::Ready,
            ParserState::Failed(_) => ParserPhase::Failed,
        }
    }

    /// The failure reason, once the parser has failed.
    pub fn failure(&self) -> Option<&Mp4Error> {
        match &self.state {
            ParserState::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Feed the next chunk. `offset` is the chunk's byte offset within the
    /// logical file and must continue exactly where the previous chunk
    /// ended; the parser never seeks. Input after ready or failure is
    /// ignored.
    pub fn feed(&mut self, chunk: &[u8], offset: u64) -> ParserPhase {
        if !matches!(self.state, ParserState::Accumulating) {
            return self.phase();
        }

        if offset != self.next_offset {
            self.state = ParserState::Failed(Mp4Error::Error {
                message: format!(
                    "non-contiguous chunk at offset {} (expected {})",
                    offset, self.next_offset
                ),
            });
            return self.phase();
        }
        self.next_offset += chunk.len() as u64;

        let mut data = chunk;
        if self.skip > 0 {
            let discard = self.skip.min(data.len() as u64) as usize;
            self.skip -= discard as u64;
            data = &data[discard..];
        }
        if !data.is_empty() {
            self.pending.extend_from_slice(data);
            self.drain_pending();
        }

        self.phase()
    }

    /// Signal end of input. A parser still accumulating fails with
    /// `NotAContainer`; a ready or failed parser is unaffected.
    pub fn flush(&mut self) -> ParserPhase {
        if matches!(self.state, ParserState::Accumulating) {
            self.pending.clear();
            self.state = ParserState::Failed(Mp4Error::NotAContainer);
        }
        self.phase()
    }

    /// Consume the parser. Only a ready parser yields a container.
    pub fn into_result(self) -> MediaGateResult<ParsedContainer> {
        match self.state {
            ParserState::Ready(container) => Ok(container),
            ParserState::Failed(err) => Err(err.into()),
            ParserState::Accumulating => Err(Mp4Error::NotAContainer.into()),
        }
    }

    fn drain_pending(&mut self) {
        while matches!(self.state, ParserState::Accumulating) {
            if self.pending.len() < 8 {
                return;
            }

            let size32 = u32::from_be_bytes([
                self.pending[0],
                self.pending[1],
                self.pending[2],
                self.pending[3],
            ]);
            let name = [
                self.pending[4],
                self.pending[5],
                self.pending[6],
                self.pending[7],
            ];

            let (box_size, header_len) = match size32 {
                0 => {
                    // box runs to the end of the file
                    if &name == b"moov" {
                        self.fail("unbounded moov box");
                        return;
                    }
                    self.pending.clear();
                    self.skip = u64::MAX;
                    return;
                }
                1 => {
                    if self.pending.len() < 16 {
                        return;
                    }
                    let large = u64::from_be_bytes([
                        self.pending[8],
                        self.pending[9],
                        self.pending[10],
                        self.pending[11],
                        self.pending[12],
                        self.pending[13],
                        self.pending[14],
                        self.pending[15],
                    ]);
                    (large, 16usize)
                }
                s => (s as u64, 8usize),
            };

            if box_size < header_len as u64 {
                self.fail(&format!("invalid box size {}", box_size));
                return;
            }

            match &name {
                b"ftyp" | b"moov" => {
                    if box_size > MAX_BUFFERED_BOX {
                        self.fail(&format!(
                            "implausibly large {} box",
                            String::from_utf8_lossy(&name)
                        ));
                        return;
                    }
                    if (self.pending.len() as u64) < box_size {
                        // keep accumulating this box
                        return;
                    }
                    let payload = self.pending[header_len..box_size as usize].to_vec();
                    self.pending.drain(..box_size as usize);
                    if &name == b"ftyp" {
                        self.take_ftyp(&payload);
                    } else {
                        self.take_moov(&payload);
                    }
                }
                _ => {
                    if &name == b"moof" {
                        self.saw_moof = true;
                    }
                    let available = self.pending.len() as u64;
                    if available >= box_size {
                        self.pending.drain(..box_size as usize);
                    } else {
                        self.skip = box_size - available;
                        self.pending.clear();
                        return;
                    }
                }
            }
        }
    }

    fn take_ftyp(&mut self, payload: &[u8]) {
        if payload.len() >= 4 {
            self.major_brand = std::str::from_utf8(&payload[0..4])
                .ok()
                .map(|s| s.trim_end().to_string());
        }
        // major brand + minor version, then compatible brands
        let mut pos = 8;
        while pos + 4 <= payload.len() {
            if let Ok(brand) = std::str::from_utf8(&payload[pos..pos + 4]) {
                self.compatible_brands.push(brand.trim_end().to_string());
            }
            pos += 4;
        }
    }

    fn take_moov(&mut self, payload: &[u8]) {
        match parse_moov_structure(payload) {
            Ok(structure) => {
                let mut entries = HashMap::new();
                let mut tracks = Vec::with_capacity(structure.tracks.len());
                for track_structure in structure.tracks {
                    entries.insert(track_structure.track.id, track_structure.entries);
                    tracks.push(track_structure.track);
                }
                self.state = ParserState::Ready(ParsedContainer {
                    info: ContainerInfo {
                        major_brand: self.major_brand.take(),
                        compatible_brands: std::mem::take(&mut self.compatible_brands),
                        timescale: structure.timescale,
                        duration: structure.duration,
                        fragmented: structure.fragmented || self.saw_moof,
                        tracks,
                    },
                    entries,
                });
                self.pending.clear();
            }
            Err(err) => {
                self.state = ParserState::Failed(match err {
                    crate::errors::MediaGateError::Mp4(e) => e,
                    other => Mp4Error::Error {
                        message: other.to_string(),
                    },
                });
            }
        }
    }

    fn fail(&mut self, message: &str) {
        self.state = ParserState::Failed(Mp4Error::Error {
            message: message.to_string(),
        });
    }
}

impl Default for ContainerParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a container from a byte stream.
///
/// Chunks are fed to the parser in order until it reports ready; a stream
/// that ends first is not a container. The stream is released on every exit
/// path, successful or not.
pub async fn parse_container(stream: &mut dyn ByteStream) -> MediaGateResult<ParsedContainer> {
    let result = drive_parser(stream).await;

    if let Err(err) = stream.cancel().await {
        log::debug!("byte stream cancel failed: {}", err);
    }

    result
}

/// Parse a container from a `MediaSource`, opening a fresh stream.
pub async fn parse_source(source: &dyn MediaSource) -> MediaGateResult<ParsedContainer> {
    let mut stream = source.open_stream().await?;
    parse_container(stream.as_mut()).await
}

async fn drive_parser(stream: &mut dyn ByteStream) -> MediaGateResult<ParsedContainer> {
    let mut parser = ContainerParser::new();
    let mut offset = 0u64;

    while parser.phase() == ParserPhase::Accumulating {
        match stream.read().await? {
            Some(chunk) => {
                parser.feed(&chunk, offset);
                offset += chunk.len() as u64;
            }
            None => {
                parser.flush();
                break;
            }
        }
    }

    parser.into_result()
}
