use crate::models::image::{CandidateFile, ImageBlob, ImageCategory, ImageSummary};
use crate::services::preview::{PreviewHandle, PreviewRegistry};

/// One accepted photo together with its preview.
#[derive(Debug)]
pub struct UploadedImage {
    pub blob: ImageBlob,
    pub preview: PreviewHandle,
    pub category: ImageCategory,
}

/// Outcome of [`ImageCollection::add`]. Rejections never fail the call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddReport {
    pub accepted: usize,
    pub rejected: usize,
}

/// Ordered set of images collected for one verification.
///
/// Previews are owned by the entries: removing an entry, clearing the
/// collection, or dropping it releases exactly the previews it created.
pub struct ImageCollection {
    registry: PreviewRegistry,
    images: Vec<UploadedImage>,
}

impl ImageCollection {
    pub fn new(registry: PreviewRegistry) -> Self {
        Self {
            registry,
            images: Vec::new(),
        }
    }

    /// Append every file whose declared media type is `image/*`, preserving
    /// order. Anything else is dropped.
    pub fn add(&mut self, files: impl IntoIterator<Item = CandidateFile>) -> AddReport {
        let mut report = AddReport::default();

        for file in files {
            if !file.is_image() {
                tracing::debug!(
                    file_name = %file.file_name,
                    media_type = %file.media_type,
                    "Dropping non-image file"
                );
                report.rejected += 1;
                continue;
            }

            let blob = ImageBlob::from(file);
            let preview = self.registry.create(&blob);
            self.images.push(UploadedImage {
                blob,
                preview,
                category: ImageCategory::General,
            });
            report.accepted += 1;
        }

        report
    }

    /// Remove the image at `index`, releasing its preview. Later entries
    /// shift down. Returns `false` when `index` is out of range.
    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.images.len() {
            return false;
        }
        drop(self.images.remove(index));
        true
    }

    /// Release every preview and empty the collection.
    pub fn clear(&mut self) {
        self.images.clear();
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UploadedImage> {
        self.images.iter()
    }

    /// Blobs in collection order, ready to be bound into a request.
    pub fn blobs(&self) -> Vec<ImageBlob> {
        self.images.iter().map(|img| img.blob.clone()).collect()
    }

    pub fn summaries(&self) -> Vec<ImageSummary> {
        self.images
            .iter()
            .enumerate()
            .map(|(index, img)| ImageSummary {
                index,
                file_name: img.blob.file_name.clone(),
                media_type: img.blob.media_type.clone(),
                size_bytes: img.blob.len(),
                preview_url: img.preview.url(),
                category: img.category,
            })
            .collect()
    }

    pub fn registry(&self) -> &PreviewRegistry {
        &self.registry
    }
}
