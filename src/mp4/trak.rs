use crate::mp4::mvhd::parse_mdhd;
use crate::mp4::r#box::find_box;
use crate::mp4::stsd::{parse_stsd, SampleEntry};
use crate::mp4::types::{Track, TrackKind, VideoGeometry};

/// A track together with its sample description entries.
///
/// The entries are kept for decoder configuration, which needs the
/// parameter-set boxes they may carry.
#[derive(Debug, Clone)]
pub(crate) struct TrackStructure {
    pub track: Track,
    pub entries: Vec<SampleEntry>,
}

/// Extract one track from a trak box payload.
///
/// Tracks with missing or unparseable structure yield `None` and are
/// skipped by the movie parser.
pub(crate) fn extract_track(trak: &[u8]) -> Option<TrackStructure> {
    let tkhd = find_box(trak, "tkhd")?;
    let (id, tkhd_geometry) = parse_tkhd(tkhd)?;

    let mdia = find_box(trak, "mdia")?;

    let hdlr = find_box(mdia, "hdlr")?;
    if hdlr.len() < 12 {
        return None;
    }
    let kind = match &hdlr[8..12] {
        b"vide" => TrackKind::Video,
        b"soun" => TrackKind::Audio,
        b"sbtl" | b"text" => TrackKind::Subtitle,
        _ => TrackKind::Unknown,
    };

    let (timescale, duration) = parse_mdhd(find_box(mdia, "mdhd")?)?;

    let minf = find_box(mdia, "minf")?;
    let stbl = find_box(minf, "stbl")?;
    let stsd = find_box(stbl, "stsd")?;
    let details = parse_stsd(stsd, kind)?;

    // sample entry geometry wins; tkhd's fixed-point geometry is the fallback
    let video = match kind {
        TrackKind::Video => details.video.or(tkhd_geometry),
        _ => None,
    };

    Some(TrackStructure {
        track: Track {
            id,
            kind,
            codec: details.codec,
            timescale,
            duration,
            video,
            audio: details.audio,
        },
        entries: details.entries,
    })
}

/// Extract the track id and the 16.16 fixed-point presentation geometry
/// from a tkhd box payload.
fn parse_tkhd(tkhd: &[u8]) -> Option<(u32, Option<VideoGeometry>)> {
    if tkhd.is_empty() {
        return None;
    }
    let (id_offset, geometry_offset) = match tkhd[0] {
        0 => (12usize, 76usize),
        1 => (20, 88),
        _ => return None,
    };
    if tkhd.len() < id_offset + 4 {
        return None;
    }
    let id = u32::from_be_bytes([
        tkhd[id_offset],
        tkhd[id_offset + 1],
        tkhd[id_offset + 2],
        tkhd[id_offset + 3],
    ]);

    let geometry = if tkhd.len() >= geometry_offset + 8 {
        let width = u32::from_be_bytes([
            tkhd[geometry_offset],
            tkhd[geometry_offset + 1],
            tkhd[geometry_offset + 2],
            tkhd[geometry_offset + 3],
        ]) >> 16;
        let height = u32::from_be_bytes([
            tkhd[geometry_offset + 4],
            tkhd[geometry_offset + 5],
            tkhd[geometry_offset + 6],
            tkhd[geometry_offset + 7],
        ]) >> 16;
        (width > 0 && height > 0).then_some(VideoGeometry { width, height })
    } else {
        None
    };

    Some((id, geometry))
}

#[cfg(test)]
mod tests {
    use super::extract_track;
    use crate::mp4::r#box::write_box_header;
    use crate::mp4::types::TrackKind;

    fn make_box(name: &str, payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        write_box_header(&mut buf, name, (payload.len() + 8) as u32);
        buf.extend_from_slice(payload);
        buf
    }

    fn build_video_trak(track_id: u32) -> Vec<u8> {
        let mut tkhd_payload = vec![0u8; 84];
        tkhd_payload[12..16].copy_from_slice(&track_id.to_be_bytes());
        tkhd_payload[76..80].copy_from_slice(&(640u32 << 16).to_be_bytes());
        tkhd_payload[80..84].copy_from_slice(&(480u32 << 16).to_be_bytes());
        let tkhd_box = make_box("tkhd", &tkhd_payload);

        let mut mdhd_payload = vec![0u8; 24];
        mdhd_payload[12..16].copy_from_slice(&90_000u32.to_be_bytes());
        mdhd_payload[16..20].copy_from_slice(&450_000u32.to_be_bytes());
        let mdhd_box = make_box("mdhd", &mdhd_payload);

        let hdlr_payload = [
            0, 0, 0, 0, 0, 0, 0, 0, b'v', b'i', b'd', b'e', 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        ];
        let hdlr_box = make_box("hdlr", &hdlr_payload);

        let mut entry_body = vec![0u8; 78];
        entry_body[24..26].copy_from_slice(&640u16.to_be_bytes());
        entry_body[26..28].copy_from_slice(&480u16.to_be_bytes());
        let avcc_payload = [
            0x01, 0x64, 0x00, 0x1F, 0xFF, 0xE1, 0x00, 0x04, 0x67, 0x64, 0x00, 0x1F, 0x01, 0x00,
            0x02, 0x68, 0xEE,
        ];
        entry_body.extend_from_slice(&make_box("avcC", &avcc_payload));
        let entry = make_box("avc1", &entry_body);

        let mut stsd_payload = vec![0, 0, 0, 0, 0, 0, 0, 1];
        stsd_payload.extend_from_slice(&entry);
        let stsd_box = make_box("stsd", &stsd_payload);
        let stbl_box = make_box("stbl", &stsd_box);
        let minf_box = make_box("minf", &stbl_box);

        let mdia_box = make_box("mdia", &[mdhd_box, hdlr_box, minf_box].concat());
        make_box("trak", &[tkhd_box, mdia_box].concat())
    }

    #[test]
    fn test_extract_video_track_from_synthetic_trak() {
        let trak = build_video_trak(3);
        let structure = extract_track(&trak[8..]).expect("track");

        assert_eq!(structure.track.id, 3);
        assert_eq!(structure.track.kind, TrackKind::Video);
        assert_eq!(structure.track.codec, "avc1.64001f");
        assert_eq!(structure.track.timescale, 90_000);
        assert_eq!(structure.track.duration, 450_000);
        let geometry = structure.track.video.unwrap();
        assert_eq!(geometry.width, 640);
        assert_eq!(geometry.height, 480);
        assert_eq!(structure.entries.len(), 1);
    }

    #[test]
    fn test_trak_without_stsd_is_skipped() {
        let trak = build_video_trak(1);
        // drop everything below mdia/minf by truncating to tkhd only
        let tkhd_only = &trak[8..8 + 92];
        assert!(extract_track(tkhd_only).is_none());
    }
}
