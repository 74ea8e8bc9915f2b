mod annotator;
mod app;
mod config;
mod error;
mod gallery;
mod geometry;
mod mapper;
mod overlay;
mod render;
mod store;

use eframe::egui;
use std::path::PathBuf;

use config::AnnotatorConfig;
use gallery::ImageGallery;

const USAGE: &str = "Usage: polygon-annotate [--config FILE] <image.png|jpg>...";

fn usage() -> ! {
    eprintln!("{USAGE}");
    std::process::exit(1);
}

fn main() -> eframe::Result<()> {
    let mut config_path = None;
    let mut images = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => match args.next() {
                Some(path) => config_path = Some(PathBuf::from(path)),
                None => usage(),
            },
            "-h" | "--help" => usage(),
            _ => images.push(PathBuf::from(arg)),
        }
    }

    let (config, config_error) = match &config_path {
        Some(path) => match AnnotatorConfig::load(path) {
            Ok(config) => (config, None),
            Err(e) => (AnnotatorConfig::default(), Some(e)),
        },
        None => (AnnotatorConfig::default(), None),
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_filter()),
    )
    .init();

    if let (Some(path), Some(e)) = (&config_path, config_error) {
        log::warn!("Using default settings, could not read {}: {e}", path.display());
    }

    for image_path in &images {
        if !image_path.exists() {
            eprintln!("File not found: {}", image_path.display());
            std::process::exit(1);
        }
    }
    let Some(gallery) = ImageGallery::new(images) else {
        usage();
    };

    let title = format!(
        "polygon-annotate — {}",
        gallery
            .current()
            .file_name()
            .unwrap_or_default()
            .to_str()
            .unwrap_or("")
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title(&title),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(app::PolygonAnnotateApp::new(config, gallery)))),
    )
}
