use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use log::info;
use log::warn;
use opencv::highgui;

use platewatch::config::DetectorConfig;
use platewatch::config::LoggerConfig;
use platewatch::config::OcrConfig;
use platewatch::config::PreprocessConfig;
use platewatch::plate_detection::bounding_box_render::BoundingBoxRender;
use platewatch::plate_detection::detector::PlateDetector;
use platewatch::plate_detection::ocr::PlateReader;
use platewatch::plate_detection::pipeline::PlatePipeline;
use platewatch::plate_detection::plate_log::PlateLog;
use platewatch::plate_detection::video_reader::VideoReader;

const WINDOW_NAME: &str = "License Plate Detection";
const KEY_QUIT: i32 = 'q' as i32;
const KEY_ESC: i32 = 27;

#[derive(Parser, Debug)]
#[command(
    name = "platewatch",
    about = "License plate detection with OCR and a de-duplicated session log"
)]
struct Args {
    /// Capture device index.
    #[arg(long, default_value_t = 0, conflicts_with = "file")]
    camera: i32,
    /// Read frames from a video file instead of a capture device.
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,
    /// Haar cascade describing plate-shaped regions.
    #[arg(long, default_value = "models/haarcascade_russian_plate_number.xml")]
    cascade: PathBuf,
    /// Tesseract data directory (system default when omitted).
    #[arg(long, value_name = "DIR")]
    tessdata: Option<PathBuf>,
    /// Tesseract language pack.
    #[arg(long, default_value = "eng")]
    lang: String,
    /// Session log of accepted plates. Truncated on every start.
    #[arg(long, default_value = "detected_plates.txt")]
    log_file: PathBuf,
    /// Record the annotated stream to an MJPG avi file.
    #[arg(long, value_name = "PATH")]
    record: Option<PathBuf>,
    /// Pace frame reads to at most this many frames per second.
    #[arg(long)]
    max_fps: Option<u64>,
    /// Run without a display window.
    #[arg(long)]
    headless: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let result = run(&args);

    // Window teardown has to happen on the error paths as well; capture and
    // recorder hold their own Drop cleanup.
    if !args.headless {
        if let Err(err) = highgui::destroy_all_windows() {
            warn!("failed to close display windows: {}", err);
        }
    }

    result
}

fn run(args: &Args) -> Result<()> {
    // Fatal tier: every collaborator is probed before the frame loop so a
    // missing model, engine or device is reported once and the process
    // exits without processing anything.
    let detector = PlateDetector::from_cascade(&args.cascade, DetectorConfig::default())?;

    let tessdata = args
        .tessdata
        .as_ref()
        .map(|dir| dir.to_str().context("tessdata path is not valid UTF-8"))
        .transpose()?;
    let reader = PlateReader::new(tessdata, &args.lang, &OcrConfig::default())?;
    info!("tesseract engine initialised (lang={})", args.lang);

    let mut source = match &args.file {
        Some(path) => VideoReader::from_file(path, args.max_fps)?,
        None => VideoReader::from_camera(args.camera, args.max_fps)?,
    };

    let log = PlateLog::create(&args.log_file, LoggerConfig::default())
        .with_context(|| format!("cannot start session log {}", args.log_file.display()))?;

    let mut pipeline = PlatePipeline::new(detector, reader, log, PreprocessConfig::default());
    let mut render = match &args.record {
        Some(path) => BoundingBoxRender::with_recording(
            path.to_str().context("record path is not valid UTF-8")?.to_string(),
        ),
        None => BoundingBoxRender::new(),
    };

    if !args.headless {
        highgui::named_window(WINDOW_NAME, highgui::WINDOW_AUTOSIZE)?;
    }
    info!("license plate detection started, press 'q' to quit");

    loop {
        let Some(mut frame) = source.next_frame() else {
            info!("frame source exhausted");
            break;
        };

        let report = pipeline.process_frame(&frame);
        if report.new_plates > 0 {
            info!(
                "{} new plate(s) logged, {} unique this session",
                report.new_plates,
                pipeline.unique_plates()
            );
        }
        if let Err(err) = render.annotate(&mut frame, &report, pipeline.unique_plates()) {
            warn!("annotation failed: {}", err);
        }

        if !args.headless {
            highgui::imshow(WINDOW_NAME, &frame)?;
            let key = highgui::wait_key(1)?;
            if key == KEY_QUIT || key == KEY_ESC {
                info!("termination key pressed");
                break;
            }
        }
    }

    info!(
        "session finished: {} unique plates logged to {}",
        pipeline.unique_plates(),
        args.log_file.display()
    );
    Ok(())
}
