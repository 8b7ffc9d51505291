use crate::bits::reader::{read_u16, read_u32};
use crate::mp4::avcc::AvccConfig;
use crate::mp4::r#box::find_box;
use crate::mp4::types::{AudioGeometry, TrackKind, VideoGeometry};

/// Child boxes of a visual sample entry start after its fixed fields
const VISUAL_ENTRY_FIXED_LEN: usize = 78;
/// Fixed fields of a version-0 audio sample entry
const AUDIO_ENTRY_FIXED_LEN: usize = 28;

/// One sample description entry of a track
#[derive(Debug, Clone)]
pub struct SampleEntry {
    /// Sample entry fourCC, e.g. "avc1" or "mp4a"
    pub format: String,
    /// Parsed avcC record, when the entry carries one
    pub avcc: Option<AvccConfig>,
}

/// Codec identity and geometry extracted from an stsd box
#[derive(Debug, Clone)]
pub struct StsdDetails {
    pub codec: String,
    pub video: Option<VideoGeometry>,
    pub audio: Option<AudioGeometry>,
    pub entries: Vec<SampleEntry>,
}

/// Parse an stsd box payload.
///
/// Codec and geometry come from the first sample description entry, as
/// players resolve them; every entry is still scanned for parameter-set
/// boxes so decoder configuration can find them later.
pub fn parse_stsd(stsd: &[u8], kind: TrackKind) -> Option<StsdDetails> {
    if stsd.len() < 8 {
        return None;
    }

    // version + flags
    let mut pos = 4;
    let entry_count = read_u32(stsd, &mut pos)?;

    let mut details: Option<StsdDetails> = None;
    let mut entries = Vec::new();

    for _ in 0..entry_count {
        let start = pos;
        let entry_size = read_u32(stsd, &mut pos)? as usize;
        if entry_size < 8 || start + entry_size > stsd.len() {
            return None;
        }
        let format = std::str::from_utf8(&stsd[pos..pos + 4]).ok()?.to_string();
        pos += 4;

        // body excludes the entry's own size and fourCC
        let body = &stsd[pos..start + entry_size];

        let avcc = if body.len() >= VISUAL_ENTRY_FIXED_LEN {
            find_box(&body[VISUAL_ENTRY_FIXED_LEN..], "avcC")
                .and_then(|payload| AvccConfig::parse(payload).ok())
        } else {
            None
        };

        if details.is_none() {
            details = Some(first_entry_details(&format, body, avcc.as_ref(), kind));
        }
        entries.push(SampleEntry { format, avcc });

        pos = start + entry_size;
    }

    details.map(|mut d| {
        d.entries = entries;
        d
    })
}

fn first_entry_details(
    format: &str,
    body: &[u8],
    avcc: Option<&AvccConfig>,
    kind: TrackKind,
) -> StsdDetails {
    let mut video = None;
    let mut audio = None;

    match kind {
        TrackKind::Video => {
            // reserved(6) + data reference index(2) + pre_defined/reserved(16)
            let mut pos = 24;
            let width = read_u16(body, &mut pos);
            let height = read_u16(body, &mut pos);
            if let (Some(width), Some(height)) = (width, height) {
                if width > 0 && height > 0 {
                    video = Some(VideoGeometry {
                        width: width as u32,
                        height: height as u32,
                    });
                }
            }
        }
        TrackKind::Audio => {
            if body.len() >= AUDIO_ENTRY_FIXED_LEN {
                // reserved(6) + data reference index(2) + reserved(8)
                let mut pos = 16;
                let channel_count = read_u16(body, &mut pos).unwrap_or(0);
                let sample_size = read_u16(body, &mut pos).unwrap_or(0);
                pos += 4; // pre_defined + reserved
                let sample_rate = read_u32(body, &mut pos).unwrap_or(0) >> 16;
                audio = Some(AudioGeometry {
                    sample_rate,
                    channel_count,
                    sample_size,
                });
            }
        }
        _ => {}
    }

    StsdDetails {
        codec: codec_string(format, avcc),
        video,
        audio,
        entries: Vec::new(),
    }
}

/// Render the RFC 6381 style codec string for a sample entry.
///
/// AVC entries append profile, compatibility, and level from the avcC
/// record; other codecs are identified by their fourCC alone.
fn codec_string(format: &str, avcc: Option<&AvccConfig>) -> String {
    match (format, avcc) {
        ("avc1" | "avc3", Some(config)) => format!(
            "{}.{:02x}{:02x}{:02x}",
            format, config.profile, config.compatibility, config.level
        ),
        _ => format.to_string(),
    }
}
