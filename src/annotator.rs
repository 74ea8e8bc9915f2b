//! Interaction state for drawing and selecting polygons on one image.
//!
//! The annotator never owns committed polygons. It reads them when hit
//! testing and proposes changes through an [`AnnotationSink`]; the host
//! applies them and hands the updated list back on the next frame.

use crate::error::{AnnotateError, Result};
use crate::geometry::{containing_polygon, Point, Polygon};

/// Receives the intents emitted by the annotator.
pub trait AnnotationSink {
    /// A draft was finished with at least three points.
    fn add_polygon(&mut self, points: Vec<Point>);
    /// The selected polygon at `index` was deleted.
    fn remove_polygon(&mut self, index: usize);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Drawing,
    Selected(usize),
}

#[derive(Debug, Default)]
pub struct Annotator {
    image_id: Option<String>,
    draft: Vec<Point>,
    selected: Option<usize>,
    dirty: bool,
}

impl Annotator {
    pub fn new() -> Self {
        Self {
            dirty: true,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> Mode {
        match self.selected {
            Some(index) => Mode::Selected(index),
            None if !self.draft.is_empty() => Mode::Drawing,
            None => Mode::Idle,
        }
    }

    pub fn draft(&self) -> &[Point] {
        &self.draft
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn can_finish(&self) -> bool {
        self.draft.len() >= Polygon::MIN_POINTS
    }

    /// Request a repaint without a state change, e.g. when the committed
    /// polygon list or the canvas size changed.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether a repaint is pending and clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Switch to another image. Draft and selection are discarded whenever
    /// the identity differs from the current one.
    pub fn set_image(&mut self, image_id: &str) -> bool {
        if self.image_id.as_deref() == Some(image_id) {
            return false;
        }
        log::debug!("annotator: image changed to {image_id}");
        self.image_id = Some(image_id.to_owned());
        self.draft.clear();
        self.selected = None;
        self.dirty = true;
        true
    }

    /// Single click. An active selection swallows the click; otherwise the
    /// point is appended to the draft. `None` (unmapped pointer) is ignored.
    pub fn click(&mut self, point: Option<Point>) {
        if self.selected.take().is_some() {
            log::debug!("annotator: click cleared selection");
            self.dirty = true;
            return;
        }
        let Some(point) = point else {
            return;
        };
        self.draft.push(point);
        self.dirty = true;
    }

    /// Double click. Always discards the draft; selects the first committed
    /// polygon containing the point, or clears the selection if none does.
    pub fn double_click(&mut self, point: Option<Point>, polygons: &[Polygon]) {
        let Some(point) = point else {
            return;
        };
        self.draft.clear();
        self.selected = containing_polygon(point, polygons);
        log::debug!("annotator: double click selected {:?}", self.selected);
        self.dirty = true;
    }

    /// Commit the draft. With fewer than three points nothing is emitted and
    /// the draft stays as it is.
    pub fn finish(&mut self, sink: &mut dyn AnnotationSink) -> Result<()> {
        if !self.can_finish() {
            return Err(AnnotateError::TooFewPoints {
                count: self.draft.len(),
            });
        }
        sink.add_polygon(std::mem::take(&mut self.draft));
        self.dirty = true;
        Ok(())
    }

    pub fn clear_draft(&mut self) {
        if !self.draft.is_empty() {
            self.draft.clear();
            self.dirty = true;
        }
    }

    /// Emit a removal for the selected polygon. Returns `false` when nothing
    /// is selected.
    pub fn delete_selected(&mut self, sink: &mut dyn AnnotationSink) -> bool {
        let Some(index) = self.selected.take() else {
            return false;
        };
        sink.remove_polygon(index);
        self.dirty = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Intent {
        Add(Vec<Point>),
        Remove(usize),
    }

    #[derive(Default)]
    struct Recorder(Vec<Intent>);

    impl AnnotationSink for Recorder {
        fn add_polygon(&mut self, points: Vec<Point>) {
            self.0.push(Intent::Add(points));
        }

        fn remove_polygon(&mut self, index: usize) {
            self.0.push(Intent::Remove(index));
        }
    }

    fn square(offset: f32) -> Polygon {
        Polygon::new(vec![
            Point::new(offset, offset),
            Point::new(offset + 10.0, offset),
            Point::new(offset + 10.0, offset + 10.0),
            Point::new(offset, offset + 10.0),
        ])
        .unwrap()
    }

    fn annotator_on(image: &str) -> Annotator {
        let mut a = Annotator::new();
        a.set_image(image);
        a
    }

    #[test]
    fn test_finish_emits_points_in_click_order() {
        let mut a = annotator_on("a.png");
        let clicks = [
            Point::new(1.0, 1.0),
            Point::new(9.0, 2.0),
            Point::new(5.0, 8.0),
            Point::new(1.0, 1.0),
        ];
        for p in clicks {
            a.click(Some(p));
        }
        assert_eq!(a.mode(), Mode::Drawing);

        let mut sink = Recorder::default();
        a.finish(&mut sink).unwrap();
        assert_eq!(sink.0, vec![Intent::Add(clicks.to_vec())]);
        assert!(a.draft().is_empty());
        assert_eq!(a.mode(), Mode::Idle);
    }

    #[test]
    fn test_finish_with_too_few_points_is_rejected() {
        let mut a = annotator_on("a.png");
        let mut sink = Recorder::default();

        assert!(matches!(
            a.finish(&mut sink),
            Err(AnnotateError::TooFewPoints { count: 0 })
        ));

        a.click(Some(Point::new(1.0, 1.0)));
        a.click(Some(Point::new(2.0, 2.0)));
        assert!(!a.can_finish());
        assert!(matches!(
            a.finish(&mut sink),
            Err(AnnotateError::TooFewPoints { count: 2 })
        ));
        assert!(sink.0.is_empty());
        assert_eq!(a.draft(), &[Point::new(1.0, 1.0), Point::new(2.0, 2.0)]);
        assert_eq!(a.mode(), Mode::Drawing);
    }

    #[test]
    fn test_clear_discards_draft() {
        let mut a = annotator_on("a.png");
        a.click(Some(Point::new(1.0, 1.0)));
        a.clear_draft();
        assert!(a.draft().is_empty());
        assert_eq!(a.mode(), Mode::Idle);
    }

    #[test]
    fn test_unmapped_click_is_skipped() {
        let mut a = annotator_on("a.png");
        a.click(None);
        assert!(a.draft().is_empty());
        a.double_click(None, &[square(0.0)]);
        assert_eq!(a.selected(), None);
    }

    #[test]
    fn test_double_click_selects_and_discards_draft() {
        let polygons = vec![square(0.0), square(100.0)];
        let mut a = annotator_on("a.png");
        a.click(Some(Point::new(50.0, 50.0)));
        a.double_click(Some(Point::new(105.0, 105.0)), &polygons);
        assert_eq!(a.mode(), Mode::Selected(1));
        assert!(a.draft().is_empty());
    }

    #[test]
    fn test_double_click_outside_clears_selection_and_draft() {
        let polygons = vec![square(0.0)];
        let mut a = annotator_on("a.png");
        a.double_click(Some(Point::new(5.0, 5.0)), &polygons);
        assert_eq!(a.selected(), Some(0));

        a.double_click(Some(Point::new(50.0, 50.0)), &polygons);
        assert_eq!(a.selected(), None);

        a.click(Some(Point::new(60.0, 60.0)));
        a.click(Some(Point::new(70.0, 60.0)));
        a.double_click(Some(Point::new(70.0, 60.0)), &polygons);
        assert!(a.draft().is_empty());
        assert_eq!(a.mode(), Mode::Idle);
    }

    #[test]
    fn test_click_while_selected_only_deselects() {
        let polygons = vec![square(0.0)];
        let mut a = annotator_on("a.png");
        a.double_click(Some(Point::new(5.0, 5.0)), &polygons);
        assert_eq!(a.selected(), Some(0));

        a.click(Some(Point::new(50.0, 50.0)));
        assert_eq!(a.selected(), None);
        assert!(a.draft().is_empty());

        a.click(Some(Point::new(50.0, 50.0)));
        assert_eq!(a.draft(), &[Point::new(50.0, 50.0)]);
    }

    #[test]
    fn test_delete_selected_emits_once() {
        let polygons = vec![square(0.0), square(100.0), square(200.0)];
        let mut a = annotator_on("a.png");
        let mut sink = Recorder::default();

        assert!(!a.delete_selected(&mut sink));
        a.double_click(Some(Point::new(205.0, 205.0)), &polygons);
        assert!(a.delete_selected(&mut sink));
        assert!(!a.delete_selected(&mut sink));

        assert_eq!(sink.0, vec![Intent::Remove(2)]);
        assert_eq!(a.selected(), None);
    }

    #[test]
    fn test_image_change_resets_state() {
        let polygons = vec![square(0.0)];
        let mut a = annotator_on("a.png");
        a.click(Some(Point::new(50.0, 50.0)));
        assert!(a.set_image("b.png"));
        assert!(a.draft().is_empty());

        a.double_click(Some(Point::new(5.0, 5.0)), &polygons);
        assert!(a.set_image("a.png"));
        assert_eq!(a.mode(), Mode::Idle);
        assert_eq!(a.selected(), None);
    }

    #[test]
    fn test_same_image_keeps_state() {
        let mut a = annotator_on("a.png");
        a.click(Some(Point::new(50.0, 50.0)));
        assert!(!a.set_image("a.png"));
        assert_eq!(a.draft().len(), 1);
    }

    #[test]
    fn test_dirty_flag_tracks_mutations() {
        let mut a = annotator_on("a.png");
        assert!(a.take_dirty());
        assert!(!a.take_dirty());

        a.click(Some(Point::new(1.0, 1.0)));
        assert!(a.take_dirty());

        a.clear_draft();
        assert!(a.take_dirty());
        a.clear_draft();
        assert!(!a.take_dirty());
    }
}
