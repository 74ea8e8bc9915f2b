//! Live annotation overlay drawn with egui shapes on top of the image
//! texture. Shares [`Scene`] and [`RenderStyle`] with the raster renderer,
//! which is only used for export.

use crate::config::{RenderStyle, ShapeStyle};
use crate::geometry::{triangulate, Polygon};
use crate::mapper::MountedCanvas;
use crate::render::Scene;

pub fn overlay_shapes(canvas: &MountedCanvas, scene: &Scene<'_>, style: &RenderStyle) -> Vec<egui::Shape> {
    let scale = (canvas.display_scale_x() + canvas.display_scale_y()) * 0.5;
    let mut shapes = Vec::new();

    for (index, polygon) in scene.polygons.iter().enumerate() {
        let shape_style = if scene.selected == Some(index) {
            &style.selected
        } else {
            &style.polygon
        };
        polygon_shapes(canvas, polygon, shape_style, scale, &mut shapes);
    }

    if !scene.draft.is_empty() {
        let draft = &style.draft;
        let color = draft.stroke.to_egui();
        let points: Vec<egui::Pos2> = scene.draft.iter().map(|&p| canvas.screen_pos(p)).collect();
        if points.len() > 1 {
            shapes.push(egui::Shape::line(
                points.clone(),
                egui::Stroke::new(draft.stroke_width * scale, color),
            ));
        }
        for p in points {
            shapes.push(egui::Shape::circle_filled(p, draft.vertex_radius * scale, color));
        }
    }
    shapes
}

fn polygon_shapes(
    canvas: &MountedCanvas,
    polygon: &Polygon,
    style: &ShapeStyle,
    scale: f32,
    shapes: &mut Vec<egui::Shape>,
) {
    let points: Vec<egui::Pos2> = polygon.points().iter().map(|&p| canvas.screen_pos(p)).collect();

    // egui only fills convex paths itself, so concave polygons go through a mesh
    let fill = style.fill.to_egui();
    let mut mesh = egui::Mesh::default();
    for &p in &points {
        mesh.colored_vertex(p, fill);
    }
    for [a, b, c] in triangulate(polygon.points()) {
        mesh.add_triangle(a as u32, b as u32, c as u32);
    }
    shapes.push(egui::Shape::mesh(mesh));

    shapes.push(egui::Shape::closed_line(
        points,
        egui::Stroke::new(style.stroke_width * scale, style.stroke.to_egui()),
    ));
}
