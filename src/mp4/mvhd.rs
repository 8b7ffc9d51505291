/// Extract timescale and duration from an mvhd box payload
pub fn parse_mvhd(mvhd: &[u8]) -> Option<(u32, u64)> {
    if mvhd.len() < 20 {
        return None;
    }

    let version = mvhd[0];
    if version == 0 {
        // Version 0: 32-bit times
        let timescale = u32::from_be_bytes([mvhd[12], mvhd[13], mvhd[14], mvhd[15]]);
        let duration = u32::from_be_bytes([mvhd[16], mvhd[17], mvhd[18], mvhd[19]]) as u64;
        Some((timescale, duration))
    } else if version == 1 {
        // Version 1: 64-bit times
        if mvhd.len() < 32 {
            return None;
        }
        let timescale = u32::from_be_bytes([mvhd[20], mvhd[21], mvhd[22], mvhd[23]]);
        let duration = u64::from_be_bytes([
            mvhd[24], mvhd[25], mvhd[26], mvhd[27], mvhd[28], mvhd[29], mvhd[30], mvhd[31],
        ]);
        Some((timescale, duration))
    } else {
        None
    }
}

/// Extract timescale and duration from an mdhd box payload.
/// Same version split as mvhd, at the media level.
pub fn parse_mdhd(mdhd: &[u8]) -> Option<(u32, u64)> {
    if mdhd.len() < 20 {
        return None;
    }

    let version = mdhd[0];
    if version == 1 {
        if mdhd.len() < 32 {
            return None;
        }
        let timescale = u32::from_be_bytes([mdhd[20], mdhd[21], mdhd[22], mdhd[23]]);
        let duration = u64::from_be_bytes([
            mdhd[24], mdhd[25], mdhd[26], mdhd[27], mdhd[28], mdhd[29], mdhd[30], mdhd[31],
        ]);
        Some((timescale, duration))
    } else if version == 0 {
        let timescale = u32::from_be_bytes([mdhd[12], mdhd[13], mdhd[14], mdhd[15]]);
        let duration = u32::from_be_bytes([mdhd[16], mdhd[17], mdhd[18], mdhd[19]]) as u64;
        Some((timescale, duration))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_mdhd, parse_mvhd};

    #[test]
    fn test_parse_mvhd_v0() {
        let mut mvhd = vec![0u8; 100];
        mvhd[12..16].copy_from_slice(&1000u32.to_be_bytes());
        mvhd[16..20].copy_from_slice(&30_000u32.to_be_bytes());
        assert_eq!(parse_mvhd(&mvhd), Some((1000, 30_000)));
    }

    #[test]
    fn test_parse_mvhd_v1() {
        let mut mvhd = vec![0u8; 112];
        mvhd[0] = 1;
        mvhd[20..24].copy_from_slice(&90_000u32.to_be_bytes());
        mvhd[24..32].copy_from_slice(&2_700_000u64.to_be_bytes());
        assert_eq!(parse_mvhd(&mvhd), Some((90_000, 2_700_000)));
    }

    #[test]
    fn test_parse_rejects_short_or_unknown_version() {
        assert_eq!(parse_mvhd(&[0u8; 10]), None);
        let mut mdhd = vec![0u8; 32];
        mdhd[0] = 2;
        assert_eq!(parse_mdhd(&mdhd), None);
    }
}
