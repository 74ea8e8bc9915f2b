//! Rasterizes the image, committed polygons and the draft into the canvas
//! backing buffer.

use std::collections::HashSet;

use image::{Rgba, RgbaImage};

use crate::config::{Color4, RenderStyle};
use crate::geometry::{point_in_polygon, Point, Polygon};

/// Everything the renderer reads. Rendering is a pure function of this,
/// the base image and the style.
#[derive(Clone, Copy, Debug)]
pub struct Scene<'a> {
    pub polygons: &'a [Polygon],
    pub draft: &'a [Point],
    pub selected: Option<usize>,
}

/// The drawing surface. Its size is the natural pixel size of the image.
pub struct Canvas {
    pixels: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn clear(&mut self) {
        for p in self.pixels.pixels_mut() {
            *p = Rgba([0, 0, 0, 0]);
        }
    }

    /// Copy `image` onto the canvas, scaling it to the canvas size if needed.
    pub fn draw_image(&mut self, image: &RgbaImage) {
        let (w, h) = self.pixels.dimensions();
        if image.dimensions() == (w, h) {
            self.pixels.clone_from(image);
        } else {
            self.pixels =
                image::imageops::resize(image, w, h, image::imageops::FilterType::Triangle);
        }
    }

    /// Fill the polygon interior, sampling pixel centers.
    pub fn fill_polygon(&mut self, polygon: &Polygon, color: Color4) {
        let rgba = color.to_rgba8();
        let (min, max) = polygon.bounds();
        let (w, h) = self.pixels.dimensions();
        let x_range = clamp_span(min.x, max.x, w);
        let y_range = clamp_span(min.y, max.y, h);

        for py in y_range {
            for px in x_range.clone() {
                let center = Point::new(px as f32 + 0.5, py as f32 + 0.5);
                if point_in_polygon(center, polygon.points()) {
                    blend_pixel(self.pixels.get_pixel_mut(px, py), rgba);
                }
            }
        }
    }

    /// Stroke a polyline, optionally closing it. Each covered pixel is blended
    /// once so translucent strokes don't darken at joints.
    pub fn stroke_path(&mut self, points: &[Point], closed: bool, width: f32, color: Color4) {
        let mut covered = HashSet::new();
        for pair in points.windows(2) {
            self.line_coverage(pair[0], pair[1], width, &mut covered);
        }
        if closed && points.len() > 2 {
            self.line_coverage(points[points.len() - 1], points[0], width, &mut covered);
        }
        if points.len() == 1 {
            self.line_coverage(points[0], points[0], width, &mut covered);
        }

        let rgba = color.to_rgba8();
        for (x, y) in covered {
            blend_pixel(self.pixels.get_pixel_mut(x, y), rgba);
        }
    }

    /// Filled disc used for vertex markers.
    pub fn fill_circle(&mut self, center: Point, radius: f32, color: Color4) {
        let rgba = color.to_rgba8();
        let (w, h) = self.pixels.dimensions();
        let x_range = clamp_span(center.x - radius, center.x + radius, w);
        let y_range = clamp_span(center.y - radius, center.y + radius, h);
        let r2 = radius * radius;

        for py in y_range {
            for px in x_range.clone() {
                let dx = px as f32 + 0.5 - center.x;
                let dy = py as f32 + 0.5 - center.y;
                if dx * dx + dy * dy <= r2 {
                    blend_pixel(self.pixels.get_pixel_mut(px, py), rgba);
                }
            }
        }
    }

    fn line_coverage(&self, a: Point, b: Point, thickness: f32, covered: &mut HashSet<(u32, u32)>) {
        let half_t = (thickness / 2.0).max(0.5) as i32;
        let (w, h) = (self.pixels.width() as i32, self.pixels.height() as i32);

        // only the part of the segment whose stamps can touch the canvas is walked
        let margin = half_t as f64 + 1.0;
        let Some((a, b)) = clip_segment(
            a,
            b,
            [-margin, -margin],
            [w as f64 + margin, h as f64 + margin],
        ) else {
            return;
        };
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len = (dx * dx + dy * dy).sqrt();
        let max_steps = 2.0 * (w + h) as f32 + 8.0 * margin as f32;
        let steps = (len * 2.0).min(max_steps) as i32;

        for i in 0..=steps {
            let t = i as f32 / steps.max(1) as f32;
            let cx = (a.x + dx * t) as i32;
            let cy = (a.y + dy * t) as i32;
            for oy in -half_t..=half_t {
                for ox in -half_t..=half_t {
                    let px = cx + ox;
                    let py = cy + oy;
                    if px >= 0 && px < w && py >= 0 && py < h {
                        covered.insert((px as u32, py as u32));
                    }
                }
            }
        }
    }
}

/// Liang–Barsky clipping of segment `a`–`b` to the box `min..=max`.
/// Computed in f64 so far-off endpoints keep the visible part accurate.
fn clip_segment(a: Point, b: Point, min: [f64; 2], max: [f64; 2]) -> Option<(Point, Point)> {
    let (x0, y0) = (a.x as f64, a.y as f64);
    let (dx, dy) = (b.x as f64 - x0, b.y as f64 - y0);
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    for (p, q) in [
        (-dx, x0 - min[0]),
        (dx, max[0] - x0),
        (-dy, y0 - min[1]),
        (dy, max[1] - y0),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
    }

    let at = |t: f64| Point::new((x0 + dx * t) as f32, (y0 + dy * t) as f32);
    Some((at(t0), at(t1)))
}

fn clamp_span(min: f32, max: f32, limit: u32) -> std::ops::Range<u32> {
    let lo = min.floor().max(0.0) as u32;
    let hi = (max.ceil().max(0.0) as u32).min(limit);
    lo.min(hi)..hi
}

/// Source-over compositing of a non-premultiplied colour.
fn blend_pixel(dst: &mut Rgba<u8>, src: [u8; 4]) {
    let sa = src[3] as f32 / 255.0;
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for c in 0..3 {
        let v = (src[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
        dst[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round() as u8;
}

/// Repaint the whole canvas from scratch.
pub fn render(canvas: &mut Canvas, base: Option<&RgbaImage>, scene: &Scene<'_>, style: &RenderStyle) {
    canvas.clear();
    if let Some(image) = base {
        canvas.draw_image(image);
    }

    for (index, polygon) in scene.polygons.iter().enumerate() {
        let shape = if scene.selected == Some(index) {
            &style.selected
        } else {
            &style.polygon
        };
        canvas.fill_polygon(polygon, shape.fill);
        canvas.stroke_path(polygon.points(), true, shape.stroke_width, shape.stroke);
    }

    if !scene.draft.is_empty() {
        let draft = &style.draft;
        canvas.stroke_path(scene.draft, false, draft.stroke_width, draft.stroke);
        for &vertex in scene.draft {
            canvas.fill_circle(vertex, draft.vertex_radius, draft.stroke);
        }
    }
}
