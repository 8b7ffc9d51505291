use serde::Serialize;

/// Track media kind derived from the handler box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
    Subtitle,
    Unknown,
}

impl TrackKind {
    pub fn name(&self) -> &str {
        match self {
            TrackKind::Video => "video",
            TrackKind::Audio => "audio",
            TrackKind::Subtitle => "subtitle",
            TrackKind::Unknown => "unknown",
        }
    }
}

/// Coded frame geometry of a video track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VideoGeometry {
    pub width: u32,
    pub height: u32,
}

/// Sample geometry of an audio track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AudioGeometry {
    pub sample_rate: u32,
    pub channel_count: u16,
    /// Bits per sample
    pub sample_size: u16,
}

/// One track described by the movie metadata
#[derive(Debug, Clone, Serialize)]
pub struct Track {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: TrackKind,
    pub codec: String,
    /// Media timescale in units per second
    pub timescale: u32,
    /// Track duration in media timescale units
    pub duration: u64,
    pub video: Option<VideoGeometry>,
    pub audio: Option<AudioGeometry>,
}

/// Read-only description of a parsed container
#[derive(Debug, Clone, Serialize)]
pub struct ContainerInfo {
    pub major_brand: Option<String>,
    pub compatible_brands: Vec<String>,
    /// Movie timescale in units per second
    pub timescale: u32,
    /// Movie duration in movie timescale units
    pub duration: u64,
    pub fragmented: bool,
    pub tracks: Vec<Track>,
}

impl ContainerInfo {
    pub fn duration_seconds(&self) -> Option<f64> {
        if self.timescale > 0 {
            Some(self.duration as f64 / self.timescale as f64)
        } else {
            None
        }
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(|t| t.kind == TrackKind::Video)
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(|t| t.kind == TrackKind::Audio)
    }
}
