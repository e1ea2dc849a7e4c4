use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};

use super::kmeans::kmeans;
use crate::config::FeatureConfig;
use crate::error::ImageLoadError;
use crate::pipeline::types::{ColorFeatures, ColorSample};

const IN_MEMORY: &str = "<in-memory>";

/// Loads an image, normalizes it to a small RGB8 copy and summarizes its colors.
#[derive(Debug, Clone)]
pub struct ColorFeatureExtractor {
    width: u32,
    height: u32,
    clusters: usize,
    max_iterations: usize,
}

impl ColorFeatureExtractor {
    pub fn new(config: &FeatureConfig) -> Self {
        Self {
            width: config.resize_width,
            height: config.resize_height,
            clusters: config.dominant_colors,
            max_iterations: config.kmeans_max_iterations,
        }
    }

    pub fn extract(&self, path: &Path) -> Result<ColorFeatures, ImageLoadError> {
        let image = image::open(path).map_err(|source| ImageLoadError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        self.features_of(&image, path)
    }

    pub fn extract_from_image(&self, image: &DynamicImage) -> Result<ColorFeatures, ImageLoadError> {
        self.features_of(image, Path::new(IN_MEMORY))
    }

    fn features_of(&self, image: &DynamicImage, origin: &Path) -> Result<ColorFeatures, ImageLoadError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ImageLoadError::Empty(PathBuf::from(origin)));
        }

        let rgb = self.normalize(image);
        let (brightness, std_dev) = channel_statistics(&rgb);
        let dominant_colors = self.dominant_colors(&rgb);

        tracing::debug!(
            "Color features for {}: brightness={:.1}, std_dev={:.1}, clusters={}",
            origin.display(),
            brightness,
            std_dev,
            dominant_colors.len()
        );

        Ok(ColorFeatures {
            brightness,
            std_dev,
            dominant_colors,
        })
    }

    fn normalize(&self, image: &DynamicImage) -> RgbImage {
        image
            .resize_exact(self.width, self.height, FilterType::Triangle)
            .to_rgb8()
    }

    fn dominant_colors(&self, image: &RgbImage) -> Vec<ColorSample> {
        let total = (image.width() * image.height()) as f32;

        let mut color_counts: HashMap<[u8; 3], usize> = HashMap::new();
        for px in image.pixels() {
            *color_counts.entry(px.0).or_insert(0) += 1;
        }

        let mut samples: Vec<([u8; 3], usize)> = if color_counts.len() <= self.clusters {
            let mut exact: Vec<_> = color_counts.into_iter().collect();
            // HashMap order is arbitrary, pin ties to the color value.
            exact.sort_by(|a, b| a.0.cmp(&b.0));
            exact
        } else {
            let pixels: Vec<[f32; 3]> = image
                .pixels()
                .map(|px| [px[0] as f32, px[1] as f32, px[2] as f32])
                .collect();
            merge_duplicates(
                kmeans(&pixels, self.clusters, self.max_iterations)
                    .into_iter()
                    .map(|c| (to_rgb(c.centroid), c.members))
                    .collect(),
            )
        };

        samples.sort_by_key(|&(_, count)| std::cmp::Reverse(count));

        let mut dominant: Vec<ColorSample> = samples
            .iter()
            .map(|&(rgb, count)| ColorSample::new(rgb, count as f32 / total))
            .collect();

        pad_to(&mut dominant, self.clusters);
        dominant
    }
}

fn to_rgb(centroid: [f32; 3]) -> [u8; 3] {
    centroid.map(|c| c.round().clamp(0.0, 255.0) as u8)
}

/// Centroids that round to the same color are one color.
fn merge_duplicates(clusters: Vec<([u8; 3], usize)>) -> Vec<([u8; 3], usize)> {
    let mut merged: Vec<([u8; 3], usize)> = Vec::with_capacity(clusters.len());
    for (rgb, count) in clusters {
        match merged.iter_mut().find(|(existing, _)| *existing == rgb) {
            Some(entry) => entry.1 += count,
            None => merged.push((rgb, count)),
        }
    }
    merged
}

/// Repeats the heaviest colors, weightless, until there are `k` entries.
fn pad_to(samples: &mut Vec<ColorSample>, k: usize) {
    let distinct = samples.len();
    if distinct == 0 {
        return;
    }
    let mut i = 0;
    while samples.len() < k {
        let rgb = samples[i % distinct].rgb;
        samples.push(ColorSample::new(rgb, 0.0));
        i += 1;
    }
}

/// Mean and population standard deviation over every channel value (Welford).
fn channel_statistics(image: &RgbImage) -> (f32, f32) {
    let mut n = 0f64;
    let mut mean = 0f64;
    let mut m2 = 0f64;

    for px in image.pixels() {
        for &v in px.0.iter() {
            let v = v as f64;
            n += 1.0;
            let delta = v - mean;
            mean += delta / n;
            m2 += delta * (v - mean);
        }
    }

    if n == 0.0 {
        (0.0, 0.0)
    } else {
        (mean as f32, (m2 / n).sqrt() as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn extractor() -> ColorFeatureExtractor {
        ColorFeatureExtractor::new(&FeatureConfig::default())
    }

    #[test]
    fn test_uniform_white_statistics() {
        let img = DynamicImage::ImageRgb8(ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(
            64,
            48,
            Rgb([255, 255, 255]),
        ));
        let features = extractor().extract_from_image(&img).unwrap();

        assert_eq!(features.brightness, 255.0);
        assert_eq!(features.std_dev, 0.0);
        assert_eq!(features.dominant_colors.len(), 5);
        assert_eq!(features.dominant_colors[0], ColorSample::new([255, 255, 255], 1.0));
        assert!(features.dominant_colors[1..].iter().all(|c| c.weight == 0.0));
    }

    #[test]
    fn test_two_tone_image_is_sorted_by_weight() {
        let img = ImageBuffer::from_fn(100, 100, |x, _| {
            if x < 75 {
                Rgb([0u8, 0, 0])
            } else {
                Rgb([255u8, 255, 255])
            }
        });
        let features = extractor()
            .extract_from_image(&DynamicImage::ImageRgb8(img))
            .unwrap();

        assert_eq!(features.dominant_colors.len(), 5);
        assert_eq!(features.dominant_colors[0].rgb, [0, 0, 0]);
        assert!((features.dominant_colors[0].weight - 0.75).abs() < 1e-6);
        assert_eq!(features.dominant_colors[1].rgb, [255, 255, 255]);
        assert!((features.total_weight() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_many_colors_still_yield_k_clusters() {
        let img = ImageBuffer::from_fn(100, 100, |x, y| {
            Rgb([(x * 2) as u8, (y * 2) as u8, ((x + y) % 256) as u8])
        });
        let features = extractor()
            .extract_from_image(&DynamicImage::ImageRgb8(img))
            .unwrap();

        assert_eq!(features.dominant_colors.len(), 5);
        let weights: Vec<f32> = features.dominant_colors.iter().map(|c| c.weight).collect();
        assert!(weights.windows(2).all(|w| w[0] >= w[1]));
        assert!((features.total_weight() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let result = extractor().extract(Path::new("/definitely/not/here.png"));
        assert!(matches!(result, Err(ImageLoadError::Decode { .. })));
    }

    #[test]
    fn test_non_image_file_is_load_error() {
        let path = std::env::temp_dir().join(format!("ecoscan-{}.png", uuid::Uuid::new_v4()));
        std::fs::write(&path, b"not an image").unwrap();
        let result = extractor().extract(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ImageLoadError::Decode { .. })));
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(matches!(
            extractor().extract_from_image(&img),
            Err(ImageLoadError::Empty(_))
        ));
    }
}
