use std::path::PathBuf;

use eframe::egui;
use image::RgbaImage;

use crate::annotator::{Annotator, Mode};
use crate::config::AnnotatorConfig;
use crate::error::{AnnotateError, Result};
use crate::gallery::ImageGallery;
use crate::geometry::{Point, Polygon};
use crate::mapper::{self, MountedCanvas};
use crate::overlay;
use crate::render::{self, Canvas, Scene};
use crate::store::{AnnotationStore, StoreSink};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "webp", "tif", "tiff"];

// ── Input dispatch ──────────────────────────────────────────────────────────

/// One frame's worth of pointer input on the canvas.
#[derive(Clone, Copy, Debug, Default)]
struct CanvasInput {
    clicked: bool,
    double_clicked: bool,
    point: Option<Point>,
}

/// egui reports the second click of a double click in the same frame as the
/// double click itself, so the click is applied first.
fn dispatch_canvas_input(annotator: &mut Annotator, polygons: &[Polygon], input: CanvasInput, blocked: bool) {
    if blocked {
        return;
    }
    if input.clicked {
        annotator.click(input.point);
    }
    if input.double_clicked {
        annotator.double_click(input.point, polygons);
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct ShortcutKeys {
    enter: bool,
    delete: bool,
    escape: bool,
    left: bool,
    right: bool,
    save: bool,
}

impl ShortcutKeys {
    fn read(input: &egui::InputState) -> Self {
        Self {
            enter: input.key_pressed(egui::Key::Enter),
            delete: input.key_pressed(egui::Key::Delete) || input.key_pressed(egui::Key::Backspace),
            escape: input.key_pressed(egui::Key::Escape),
            left: input.key_pressed(egui::Key::ArrowLeft),
            right: input.key_pressed(egui::Key::ArrowRight),
            save: input.modifiers.ctrl && input.key_pressed(egui::Key::S),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Finish,
    Delete,
    ClearDraft,
    Prev,
    Next,
    Export,
    DismissWarning,
}

/// While the warning is up, Enter or Escape only dismiss it.
fn shortcut_actions(keys: ShortcutKeys, blocked: bool) -> Vec<Action> {
    if blocked {
        return if keys.enter || keys.escape {
            vec![Action::DismissWarning]
        } else {
            Vec::new()
        };
    }
    [
        (keys.enter, Action::Finish),
        (keys.delete, Action::Delete),
        (keys.escape, Action::ClearDraft),
        (keys.left, Action::Prev),
        (keys.right, Action::Next),
        (keys.save, Action::Export),
    ]
    .into_iter()
    .filter_map(|(pressed, action)| pressed.then_some(action))
    .collect()
}

// ── App ─────────────────────────────────────────────────────────────────────

pub struct PolygonAnnotateApp {
    config: AnnotatorConfig,
    gallery: ImageGallery,
    store: AnnotationStore,
    annotator: Annotator,

    // decoded pixels of the current image; `None` until it loads
    image: Option<RgbaImage>,
    // uploaded once per image, annotations are drawn over it as shapes
    texture: Option<egui::TextureHandle>,

    // blocking warning shown in a modal window
    warning: Option<String>,
}

impl PolygonAnnotateApp {
    pub fn new(config: AnnotatorConfig, gallery: ImageGallery) -> Self {
        let mut app = Self {
            config,
            gallery,
            store: AnnotationStore::new(),
            annotator: Annotator::new(),
            image: None,
            texture: None,
            warning: None,
        };
        app.load_current();
        app
    }

    /// Switch the annotator to the gallery's current image and decode it.
    fn load_current(&mut self) {
        let path = self.gallery.current().to_path_buf();
        self.annotator.set_image(&path.to_string_lossy());
        self.texture = None;

        match image::open(&path) {
            Ok(img) => {
                let rgba = img.to_rgba8();
                log::info!(
                    "Loaded {} ({}x{})",
                    path.display(),
                    rgba.width(),
                    rgba.height()
                );
                self.image = Some(rgba);
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.image = None;
            }
        }
        self.annotator.mark_dirty();
    }

    fn open_images(&mut self) {
        let Some(files) = rfd::FileDialog::new()
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_files()
        else {
            return;
        };
        if let Some(gallery) = ImageGallery::new(files) {
            self.gallery = gallery;
            self.load_current();
        }
    }

    fn finish_polygon(&mut self) {
        let mut sink = StoreSink {
            store: &mut self.store,
            image: self.gallery.current(),
        };
        if let Err(e) = self.annotator.finish(&mut sink) {
            log::warn!("Rejected polygon: {e}");
            self.warning = Some(e.to_string());
        }
    }

    fn delete_selected(&mut self) {
        let mut sink = StoreSink {
            store: &mut self.store,
            image: self.gallery.current(),
        };
        self.annotator.delete_selected(&mut sink);
    }

    /// Write the image with its committed polygons to `<stem>_annotated.png`.
    fn export_annotated(&mut self) -> Result<PathBuf> {
        let base = self.image.as_ref().ok_or(AnnotateError::NoImageLoaded)?;
        let image_path = self.gallery.current();
        let scene = Scene {
            polygons: self.store.polygons(image_path),
            draft: &[],
            selected: None,
        };
        let mut canvas = Canvas::new(base.width(), base.height());
        render::render(&mut canvas, Some(base), &scene, &self.config.style);

        let out_path = image_path.with_file_name(format!(
            "{}_annotated.png",
            image_path
                .file_stem()
                .unwrap_or_default()
                .to_str()
                .unwrap_or("out")
        ));
        canvas.pixels().save(&out_path)?;
        Ok(out_path)
    }

    fn export(&mut self) {
        match self.export_annotated() {
            Ok(path) => log::info!("Exported to {}", path.display()),
            Err(e) => log::error!("Export failed: {e}"),
        }
    }

    fn ensure_texture(&mut self, ctx: &egui::Context) {
        if self.texture.is_some() {
            return;
        }
        let Some(image) = self.image.as_ref() else {
            return;
        };
        let size = [image.width() as usize, image.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
        self.texture = Some(ctx.load_texture("image", color_image, egui::TextureOptions::LINEAR));
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Finish => self.finish_polygon(),
            Action::Delete => self.delete_selected(),
            Action::ClearDraft => self.annotator.clear_draft(),
            Action::Prev => {
                self.gallery.prev_image();
                self.load_current();
            }
            Action::Next => {
                self.gallery.next_image();
                self.load_current();
            }
            Action::Export => self.export(),
            Action::DismissWarning => self.warning = None,
        }
    }

    fn status_text(&mut self) -> String {
        let count = self.store.polygons(self.gallery.current()).len();
        let mode = match self.annotator.mode() {
            Mode::Idle => "Click to start a polygon, double-click one to select it".to_owned(),
            Mode::Drawing => format!("Drawing: {} points", self.annotator.draft().len()),
            Mode::Selected(index) => format!("Polygon {} selected", index + 1),
        };
        format!("{count} polygons · {mode}")
    }

    fn show_warning(&mut self, ctx: &egui::Context) {
        let Some(message) = self.warning.clone() else {
            return;
        };
        egui::Window::new("Cannot finish polygon")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                if ui.button("OK").clicked() {
                    self.warning = None;
                }
            });
    }
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for PolygonAnnotateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let blocked = self.warning.is_some();

        // Keyboard shortcuts
        let keys = ctx.input(ShortcutKeys::read);
        for action in shortcut_actions(keys, blocked) {
            self.apply(action);
        }

        // Top toolbar
        let mut clicked = None;
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.add_enabled_ui(!blocked, |ui| {
                ui.horizontal(|ui| {
                    if ui.button("Prev").clicked() {
                        clicked = Some(Action::Prev);
                    }
                    ui.label(format!(
                        "{} / {}: {}",
                        self.gallery.index() + 1,
                        self.gallery.total(),
                        self.gallery
                            .current()
                            .file_name()
                            .unwrap_or_default()
                            .to_string_lossy()
                    ));
                    if ui.button("Next").clicked() {
                        clicked = Some(Action::Next);
                    }
                    if ui.button("Open…").clicked() {
                        self.open_images();
                    }
                    ui.separator();
                    if ui
                        .add_enabled(self.annotator.can_finish(), egui::Button::new("Finish Polygon"))
                        .clicked()
                    {
                        clicked = Some(Action::Finish);
                    }
                    if ui
                        .add_enabled(
                            self.annotator.selected().is_some(),
                            egui::Button::new("Delete Selected Polygon"),
                        )
                        .clicked()
                    {
                        clicked = Some(Action::Delete);
                    }
                    if ui
                        .add_enabled(
                            !self.annotator.draft().is_empty(),
                            egui::Button::new("Clear Current Drawing"),
                        )
                        .clicked()
                    {
                        clicked = Some(Action::ClearDraft);
                    }
                    ui.separator();
                    if ui
                        .add_enabled(self.image.is_some(), egui::Button::new("Export"))
                        .clicked()
                    {
                        clicked = Some(Action::Export);
                    }
                });
            });
        });
        if let Some(action) = clicked {
            self.apply(action);
        }

        let status = self.status_text();
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.label(status);
        });

        // Canvas
        self.ensure_texture(ctx);
        egui::CentralPanel::default().show(ctx, |ui| {
            let (Some(texture_id), Some(image)) = (self.texture.as_ref().map(|t| t.id()), self.image.as_ref()) else {
                ui.centered_and_justified(|ui| {
                    ui.label(format!("Cannot display {}", self.gallery.current().display()));
                });
                return;
            };

            let pixel_size = [image.width() as usize, image.height() as usize];
            let natural = egui::vec2(pixel_size[0] as f32, pixel_size[1] as f32);
            let available = ui.available_size();
            let scale = (available.x / natural.x)
                .min(available.y / natural.y)
                .min(1.0);
            let (rect, response) = ui.allocate_exact_size(natural * scale, egui::Sense::click());
            let response = response.on_hover_cursor(egui::CursorIcon::Crosshair);
            let mounted = MountedCanvas::new(rect, pixel_size);

            let polygons = self.store.polygons(self.gallery.current());
            let input = CanvasInput {
                clicked: response.clicked(),
                double_clicked: response.double_clicked(),
                point: response
                    .interact_pointer_pos()
                    .and_then(|pos| mapper::map_pointer(Some(&mounted), pos)),
            };
            dispatch_canvas_input(&mut self.annotator, polygons, input, blocked);

            let painter = ui.painter_at(rect);
            painter.image(
                texture_id,
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
            let scene = Scene {
                polygons,
                draft: self.annotator.draft(),
                selected: self.annotator.selected(),
            };
            painter.extend(overlay::overlay_shapes(&mounted, &scene, &self.config.style));
            ui.painter().rect_stroke(
                rect,
                2.0,
                egui::Stroke::new(1.0, egui::Color32::from_gray(160)),
                egui::StrokeKind::Outside,
            );
        });

        self.show_warning(ctx);

        if self.annotator.take_dirty() {
            ctx.request_repaint();
        }
    }
}
