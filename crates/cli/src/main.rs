use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use facemark_core::detection::domain::mesh_detector::MeshDetector;
use facemark_core::detection::infrastructure::model_resolver::{self, ProgressFn};
use facemark_core::detection::infrastructure::onnx_mesh_detector::MeshDetectorConfig;
use facemark_core::imaging::{decode, encode};
use facemark_core::pipeline::detect_image_use_case::DetectImageUseCase;
use facemark_core::shared::constants::{
    DEFAULT_CONFIDENCE, DEFAULT_MAX_FACES, FACE_FINDER_MODEL_NAME, FACE_FINDER_MODEL_URL,
    MAX_IMAGE_DIMENSION, MESH_MODEL_NAME, MESH_MODEL_URL, TOTAL_LANDMARKS,
};

/// Face landmark detection for still images.
#[derive(Parser)]
#[command(name = "facemark")]
struct Cli {
    /// Input image (jpg, jpeg, png).
    input: PathBuf,

    /// Output path for the annotated image (default: <input>_landmarks.png).
    output: Option<PathBuf>,

    /// Detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE as f32)]
    confidence: f32,

    /// Faces to process per image.
    #[arg(long, default_value_t = DEFAULT_MAX_FACES)]
    max_faces: usize,

    /// Bound on the longer image dimension before detection.
    #[arg(long, default_value_t = MAX_IMAGE_DIMENSION)]
    max_dimension: u32,

    /// Directory holding pre-downloaded model files.
    #[arg(long)]
    model_dir: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    log::info!("analyzing {}", cli.input.display());
    let frame = decode::load(&cli.input)?;
    let detector = build_detector(&cli)?;
    let mut use_case = DetectImageUseCase::new(detector, cli.max_dimension);

    let outcome = use_case.execute(frame)?;

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output(&cli.input));
    encode::save(&output, &outcome.annotated)?;

    if outcome.summary.success {
        println!("Faces detected:  {}", outcome.summary.face_count);
        println!(
            "Landmarks:       {}/{TOTAL_LANDMARKS}",
            outcome.summary.landmark_count
        );
        println!("Coverage:        {:.1}%", outcome.summary.coverage_percent());
    } else {
        println!("No face detected.");
        println!("Tips: use a well-lit, front-facing photo of reasonable quality.");
    }
    println!("Annotated image: {}", output.display());

    Ok(())
}

fn build_detector(cli: &Cli) -> Result<Box<dyn MeshDetector>, Box<dyn std::error::Error>> {
    let face_model = resolve_model(FACE_FINDER_MODEL_NAME, FACE_FINDER_MODEL_URL, cli)?;
    let mesh_model = resolve_model(MESH_MODEL_NAME, MESH_MODEL_URL, cli)?;

    let detector = MeshDetectorConfig::new(face_model, mesh_model)
        .with_confidence(cli.confidence)
        .with_max_faces(cli.max_faces)
        .build();
    Ok(Box::new(detector))
}

fn resolve_model(
    name: &str,
    url: &str,
    cli: &Cli,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let progress: ProgressFn = Box::new(|downloaded, total| {
        if total > 0 {
            eprint!("\rDownloading model: {}%", downloaded * 100 / total);
        }
    });
    let path = model_resolver::resolve(name, url, cli.model_dir.as_deref(), Some(progress))?;
    eprintln!();
    Ok(path)
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("annotated");
    input.with_file_name(format!("{stem}_landmarks.png"))
}
