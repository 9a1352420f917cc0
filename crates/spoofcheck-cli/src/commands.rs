//! `spoofcheck detect | score | normalize`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use spoofcheck_client::{ClientConfig, RemoteSpoofDetector};
use spoofcheck_core::{mirror_all, BoundingBox, CapturedImage, Orientation, SpoofDetector};

use crate::ImageArgs;

/// Exit status reported by `score` when the image is judged a spoof.
const SPOOF_EXIT_CODE: u8 = 2;

fn load_config(path: Option<PathBuf>) -> Result<ClientConfig> {
    match path {
        Some(path) => ClientConfig::from_toml_file(&path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => ClientConfig::from_env().context("failed to load config from environment"),
    }
}

fn load_image(args: &ImageArgs) -> Result<CapturedImage> {
    let orientation = Orientation::from_exif(args.orientation)
        .with_context(|| format!("invalid EXIF orientation {}", args.orientation))?;
    let pixels = CapturedImage::open(&args.image)?.into_pixels();
    let image = CapturedImage::with_orientation(pixels, orientation);
    tracing::debug!(
        path = %args.image.display(),
        width = image.width(),
        height = image.height(),
        ?orientation,
        "image loaded"
    );
    Ok(image)
}

fn build_detector(config_path: Option<PathBuf>) -> Result<RemoteSpoofDetector> {
    let config = load_config(config_path)?;
    RemoteSpoofDetector::new(config).context("failed to initialise detector")
}

/// Run detection and print each box in original image coordinates.
pub async fn detect(
    config_path: Option<PathBuf>,
    input: ImageArgs,
    mirror: bool,
    json: bool,
) -> Result<ExitCode> {
    let detector = build_detector(config_path)?;
    let image = load_image(&input)?;

    let mut detections = detector
        .detect_spoof_devices(&image)
        .await
        .with_context(|| format!("detection failed for {}", input.image.display()))?;
    if mirror {
        detections = mirror_all(&detections, image.width() as f64);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&detections)?);
    } else if detections.is_empty() {
        println!("No spoof devices detected.");
    } else {
        for (i, d) in detections.iter().enumerate() {
            let b = &d.bounding_box;
            println!(
                "  [{i}] confidence {:.4}  box ({:.1}, {:.1}) - ({:.1}, {:.1})",
                d.confidence, b.xmin, b.ymin, b.xmax, b.ymax
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Print the spoof score and verdict.
pub async fn score(
    config_path: Option<PathBuf>,
    input: ImageArgs,
    roi: Option<BoundingBox>,
) -> Result<ExitCode> {
    let detector = build_detector(config_path)?;
    let threshold = detector.config().confidence_threshold;
    let image = load_image(&input)?;

    let verdict = detector
        .is_spoof(&image, roi, threshold)
        .await
        .with_context(|| format!("detection failed for {}", input.image.display()))?;

    println!("Spoof score: {:.4} (threshold {threshold:.4})", verdict.score);
    if verdict.is_spoof {
        println!("Verdict: SPOOF ({} enclosing detection(s))", verdict.contributing);
        Ok(ExitCode::from(SPOOF_EXIT_CODE))
    } else {
        println!("Verdict: live");
        Ok(ExitCode::SUCCESS)
    }
}

/// Write the canonical frame to `output`.
pub fn normalize(input: ImageArgs, output: &Path, side: u32) -> Result<ExitCode> {
    let image = load_image(&input)?;
    let frame = spoofcheck_core::normalize(&image, side)?;
    let png = frame.encode_png()?;
    std::fs::write(output, png)
        .with_context(|| format!("failed to write {}", output.display()))?;

    let t = frame.transform();
    println!("Canonical frame: {}", output.display());
    println!("  side:   {side}");
    println!("  scale:  {:.6}", t.scale);
    println!("  offset: ({:.2}, {:.2})", t.tx, t.ty);
    Ok(ExitCode::SUCCESS)
}
