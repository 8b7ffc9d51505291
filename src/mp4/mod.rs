pub mod r#box;
pub use r#box::{find_box, find_box_range};

pub mod types;
pub use types::{AudioGeometry, ContainerInfo, Track, TrackKind, VideoGeometry};

pub mod mvhd;
pub use mvhd::parse_mvhd;

pub mod avcc;
pub use avcc::AvccConfig;

pub mod stsd;
pub mod trak;

pub mod moov;
pub use moov::parse_moov;

pub mod parser;
pub use parser::{parse_container, parse_source, ContainerParser, ParsedContainer, ParserPhase};

pub mod decoder;
pub use decoder::{build_decoder_config, DecoderConfig};
