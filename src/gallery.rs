//! The ordered list of images being annotated.

use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct ImageGallery {
    images: Vec<PathBuf>,
    index: usize,
}

impl ImageGallery {
    /// `None` if `images` is empty.
    pub fn new(images: Vec<PathBuf>) -> Option<Self> {
        if images.is_empty() {
            return None;
        }
        Some(Self { images, index: 0 })
    }

    pub fn current(&self) -> &Path {
        &self.images[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.images.len()
    }

    /// Advance, wrapping from the last image to the first.
    pub fn next_image(&mut self) -> &Path {
        self.index = if self.index + 1 == self.images.len() {
            0
        } else {
            self.index + 1
        };
        self.current()
    }

    /// Go back, wrapping from the first image to the last.
    pub fn prev_image(&mut self) -> &Path {
        self.index = if self.index == 0 {
            self.images.len() - 1
        } else {
            self.index - 1
        };
        self.current()
    }
}
