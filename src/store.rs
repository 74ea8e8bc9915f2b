//! Per-image polygon persistence.
//!
//! Polygons for `photo.jpg` live next to it in `photo.jpg.annotz`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::annotator::AnnotationSink;
use crate::error::Result;
use crate::geometry::{Point, Polygon};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct AnnotationFile {
    polygons: Vec<Polygon>,
}

pub fn annotz_path(image_path: &Path) -> PathBuf {
    image_path.with_extension(format!(
        "{}.annotz",
        image_path
            .extension()
            .unwrap_or_default()
            .to_str()
            .unwrap_or("")
    ))
}

pub fn load_polygons(image_path: &Path) -> Result<Vec<Polygon>> {
    let path = annotz_path(image_path);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let data = std::fs::read_to_string(&path)?;
    let file: AnnotationFile = serde_json::from_str(&data)?;
    Ok(file.polygons)
}

pub fn save_polygons(image_path: &Path, polygons: &[Polygon]) -> Result<()> {
    let file = AnnotationFile {
        polygons: polygons.to_vec(),
    };
    let data = serde_json::to_string_pretty(&file)?;
    std::fs::write(annotz_path(image_path), data)?;
    Ok(())
}

/// Committed polygons for every image seen so far, loaded lazily and written
/// back after each change.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    entries: HashMap<PathBuf, Vec<Polygon>>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn polygons(&mut self, image: &Path) -> &[Polygon] {
        self.entry(image)
    }

    pub fn add(&mut self, image: &Path, polygon: Polygon) -> Result<()> {
        self.entry(image).push(polygon);
        self.persist(image)
    }

    /// Remove the polygon at `index`. Out-of-range indices are ignored.
    pub fn remove(&mut self, image: &Path, index: usize) -> Result<Option<Polygon>> {
        let polygons = self.entry(image);
        if index >= polygons.len() {
            log::warn!(
                "Ignoring removal of polygon {index}: {} has {} polygons",
                image.display(),
                polygons.len()
            );
            return Ok(None);
        }
        let removed = polygons.remove(index);
        self.persist(image)?;
        Ok(Some(removed))
    }

    fn entry(&mut self, image: &Path) -> &mut Vec<Polygon> {
        self.entries.entry(image.to_path_buf()).or_insert_with(|| {
            load_polygons(image).unwrap_or_else(|e| {
                log::warn!("Failed to load annotations for {}: {e}", image.display());
                Vec::new()
            })
        })
    }

    fn persist(&self, image: &Path) -> Result<()> {
        let polygons = self.entries.get(image).map(Vec::as_slice).unwrap_or(&[]);
        save_polygons(image, polygons)?;
        log::info!(
            "Saved {} polygons to {}",
            polygons.len(),
            annotz_path(image).display()
        );
        Ok(())
    }
}

/// Applies annotator intents to the store for one image.
pub struct StoreSink<'a> {
    pub store: &'a mut AnnotationStore,
    pub image: &'a Path,
}

impl AnnotationSink for StoreSink<'_> {
    fn add_polygon(&mut self, points: Vec<Point>) {
        let result = Polygon::new(points).and_then(|polygon| self.store.add(self.image, polygon));
        if let Err(e) = result {
            log::error!("Failed to add polygon to {}: {e}", self.image.display());
        }
    }

    fn remove_polygon(&mut self, index: usize) {
        if let Err(e) = self.store.remove(self.image, index) {
            log::error!("Failed to remove polygon from {}: {e}", self.image.display());
        }
    }
}
