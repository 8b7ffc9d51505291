use crate::errors::{MediaGateResult, Mp4Error};
use crate::mp4::parser::ParsedContainer;
use crate::mp4::types::Track;
use serde::Serialize;

/// Everything a video decoder needs to be configured for one track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecoderConfig {
    pub codec: String,
    pub coded_width: u32,
    pub coded_height: u32,
    /// Out-of-band parameter sets for codecs that store them outside the
    /// sample bitstream; absent for codecs that carry them in-band.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Vec<u8>>,
}

/// Build the decoder configuration for a video track of a parsed container.
///
/// H.264 in avc1 storage keeps its SPS/PPS in the avcC box rather than in
/// the sample data, so the decoder needs that record to split the stream
/// into NALUs. The description is the avcC box serialized big-endian with
/// its 8-byte header stripped. A track whose codec demands a description
/// but whose sample entries carry none is an error, never a partial config.
pub fn build_decoder_config(
    container: &ParsedContainer,
    track: &Track,
) -> MediaGateResult<DecoderConfig> {
    let geometry = track.video.ok_or_else(|| Mp4Error::Error {
        message: format!("track {} is not a video track", track.id),
    })?;

    let mut config = DecoderConfig {
        codec: track.codec.clone(),
        coded_width: geometry.width,
        coded_height: geometry.height,
        description: None,
    };

    if track.codec.starts_with("avc1") {
        for entry in container.sample_entries(track.id) {
            if let Some(avcc) = &entry.avcc {
                let boxed = avcc.to_box_bytes();
                // drop the box header, keep the record
                config.description = Some(boxed[8..].to_vec());
                break;
            }
        }

        if config.description.is_none() {
            return Err(Mp4Error::MissingCodecDescription {
                codec: track.codec.clone(),
            }
            .into());
        }
    }

    Ok(config)
}
