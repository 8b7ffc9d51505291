use mediagate::{
    build_decoder_config, fingerprint_source, parse_source, LocalMediaFile, MediaSource, TrackKind,
};
use std::env;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Usage: container_probe <file.mp4>");
        return;
    }
    let file_path = &args[1];

    match probe(file_path).await {
        Ok(_) => println!("\nProbe completed successfully"),
        Err(e) => println!("\nProbe failed: {}", e),
    }
}

async fn probe(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let source = LocalMediaFile::open(path)?;

    println!("File: {}", path);
    println!("Size: {} bytes", source.size());

    let fingerprint = fingerprint_source(&source).await?;
    println!("Fingerprint: {}", fingerprint);

    let container = parse_source(&source).await?;
    let info = container.info();

    println!();
    println!(
        "Brand: {} (compatible: {})",
        info.major_brand.as_deref().unwrap_or("?"),
        info.compatible_brands.join(", ")
    );
    println!(
        "Duration: {:.3}s (timescale {})",
        info.duration_seconds().unwrap_or(0.0),
        info.timescale
    );
    println!("Fragmented: {}", info.fragmented);
    println!("Tracks: {}", info.tracks.len());

    for track in &info.tracks {
        print!("  #{} {} codec={}", track.id, track.kind.name(), track.codec);
        if let Some(video) = &track.video {
            print!(" {}x{}", video.width, video.height);
        }
        if let Some(audio) = &track.audio {
            print!(
                " {}Hz {}ch {}bit",
                audio.sample_rate, audio.channel_count, audio.sample_size
            );
        }
        println!();
    }

    if let Some(track) = info.tracks.iter().find(|t| t.kind == TrackKind::Video) {
        let config = build_decoder_config(&container, track)?;
        println!();
        println!(
            "Decoder config: codec={} {}x{} description={} bytes",
            config.codec,
            config.coded_width,
            config.coded_height,
            config.description.as_ref().map(Vec::len).unwrap_or(0)
        );
    }

    Ok(())
}
