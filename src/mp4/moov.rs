use crate::errors::{MediaGateResult, Mp4Error};
use crate::mp4::mvhd::parse_mvhd;
use crate::mp4::r#box::{find_box, parse_box_header};
use crate::mp4::trak::{extract_track, TrackStructure};

/// Movie-level structure parsed from a moov box
#[derive(Debug, Clone)]
pub(crate) struct MovieStructure {
    pub timescale: u32,
    pub duration: u64,
    /// An mvex box announces movie fragments
    pub fragmented: bool,
    pub tracks: Vec<TrackStructure>,
}

/// Parse a moov box payload into movie metadata and tracks.
///
/// A moov without a readable mvhd is malformed and fails outright; an
/// individual trak that cannot be understood is skipped.
pub(crate) fn parse_moov_structure(moov: &[u8]) -> MediaGateResult<MovieStructure> {
    let mvhd = find_box(moov, "mvhd").ok_or(Mp4Error::Error {
        message: "moov box has no mvhd".to_string(),
    })?;
    let (timescale, duration) = parse_mvhd(mvhd).ok_or(Mp4Error::Error {
        message: "mvhd box is malformed".to_string(),
    })?;

    let fragmented = find_box(moov, "mvex").is_some();

    // walk the moov children collecting tracks
    let mut tracks = Vec::new();
    let mut pos = 0usize;
    while pos + 8 <= moov.len() {
        let start = pos;
        let Some((name, size)) = parse_box_header(moov, &mut pos) else {
            break;
        };
        let header_len = (pos - start) as u64;
        if size < header_len || size > (moov.len() - start) as u64 {
            break;
        }

        if &name == b"trak" {
            if let Some(structure) = extract_track(&moov[pos..start + size as usize]) {
                tracks.push(structure);
            }
        }

        pos = start + size as usize;
    }

    Ok(MovieStructure {
        timescale,
        duration,
        fragmented,
        tracks,
    })
}

/// Public alias retained for direct moov payload inspection.
pub fn parse_moov(moov: &[u8]) -> MediaGateResult<crate::mp4::types::ContainerInfo> {
    let structure = parse_moov_structure(moov)?;
    Ok(crate::mp4::types::ContainerInfo {
        major_brand: None,
        compatible_brands: Vec::new(),
        timescale: structure.timescale,
        duration: structure.duration,
        fragmented: structure.fragmented,
        tracks: structure.tracks.into_iter().map(|t| t.track).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::parse_moov;
    use crate::mp4::r#box::write_box_header;

    fn make_box(name: &str, payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        write_box_header(&mut buf, name, (payload.len() + 8) as u32);
        buf.extend_from_slice(payload);
        buf
    }

    fn mvhd_box(timescale: u32, duration: u32) -> Vec<u8> {
        let mut payload = vec![0u8; 100];
        payload[12..16].copy_from_slice(&timescale.to_be_bytes());
        payload[16..20].copy_from_slice(&duration.to_be_bytes());
        make_box("mvhd", &payload)
    }

    #[test]
    fn test_moov_without_mvhd_fails() {
        let moov = make_box("free", &[0; 4]);
        assert!(parse_moov(&moov).is_err());
    }

    #[test]
    fn test_moov_with_mvex_is_fragmented() {
        let mut moov = mvhd_box(1000, 5000);
        moov.extend_from_slice(&make_box("mvex", &[0; 8]));

        let info = parse_moov(&moov).unwrap();
        assert_eq!(info.timescale, 1000);
        assert_eq!(info.duration, 5000);
        assert!(info.fragmented);
        assert!(info.tracks.is_empty());
    }

    #[test]
    fn test_unparseable_trak_is_skipped() {
        let mut moov = mvhd_box(600, 1200);
        moov.extend_from_slice(&make_box("trak", &[0; 16]));

        let info = parse_moov(&moov).unwrap();
        assert!(info.tracks.is_empty());
        assert_eq!(info.duration_seconds(), Some(2.0));
    }
}
