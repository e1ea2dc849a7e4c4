/// Deterministic k-means over RGB pixels. Initialisation picks the pixel closest to the
/// median luminance, then repeatedly the pixel farthest from every chosen center, so the
/// same image always yields the same clusters.

#[derive(Debug, Clone, Copy)]
struct Center {
    rgb: [f32; 3],
    sum: [f64; 3],
    count: usize,
}

impl Center {
    fn new(rgb: [f32; 3]) -> Self {
        Self {
            rgb,
            sum: [0.0; 3],
            count: 0,
        }
    }

    fn add_sample(&mut self, px: [f32; 3]) {
        for i in 0..3 {
            self.sum[i] += px[i] as f64;
        }
        self.count += 1;
    }

    fn update_centroid(&mut self) {
        if self.count > 0 {
            for i in 0..3 {
                self.rgb[i] = (self.sum[i] / self.count as f64) as f32;
            }
        }
        self.sum = [0.0; 3];
        self.count = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cluster {
    pub centroid: [f32; 3],
    pub members: usize,
}

fn distance_sq(a: [f32; 3], b: [f32; 3]) -> f32 {
    (0..3).map(|i| (a[i] - b[i]) * (a[i] - b[i])).sum()
}

fn luma(px: [f32; 3]) -> f32 {
    // Rec. 709 luminance
    0.2126 * px[0] + 0.7152 * px[1] + 0.0722 * px[2]
}

fn nearest(centers: &[Center], px: [f32; 3]) -> usize {
    let mut best_idx = 0;
    let mut best_dist = f32::MAX;
    for (i, center) in centers.iter().enumerate() {
        let dist = distance_sq(px, center.rgb);
        if dist < best_dist {
            best_dist = dist;
            best_idx = i;
        }
    }
    best_idx
}

fn init_centers(pixels: &[[f32; 3]], k: usize) -> Vec<Center> {
    let n = pixels.len();
    let mut centers = Vec::with_capacity(k);
    let mut chosen = vec![false; n];

    let mut by_luma: Vec<(usize, f32)> = pixels.iter().enumerate().map(|(i, p)| (i, luma(*p))).collect();
    by_luma.sort_by(|a, b| a.1.total_cmp(&b.1));
    let first = by_luma[n / 2].0;
    centers.push(Center::new(pixels[first]));
    chosen[first] = true;

    let mut min_distances: Vec<f32> = pixels.iter().map(|p| distance_sq(*p, pixels[first])).collect();

    while centers.len() < k {
        let best = min_distances
            .iter()
            .enumerate()
            .filter(|(i, _)| !chosen[*i])
            .max_by(|a, b| a.1.total_cmp(b.1).then(b.0.cmp(&a.0)))
            .map(|(i, _)| i);

        let Some(best) = best else { break };
        chosen[best] = true;
        let rgb = pixels[best];
        for (min_d, px) in min_distances.iter_mut().zip(pixels) {
            let d = distance_sq(*px, rgb);
            if d < *min_d {
                *min_d = d;
            }
        }
        centers.push(Center::new(rgb));
    }

    centers
}

/// Clusters `pixels` into at most `k` groups. Returned in cluster-index order.
pub fn kmeans(pixels: &[[f32; 3]], k: usize, max_iterations: usize) -> Vec<Cluster> {
    if pixels.is_empty() || k == 0 {
        return Vec::new();
    }

    let k = k.min(pixels.len());
    let mut centers = init_centers(pixels, k);
    let mut labels: Vec<usize> = pixels.iter().map(|p| nearest(&centers, *p)).collect();

    for _ in 0..max_iterations {
        for (px, &label) in pixels.iter().zip(labels.iter()) {
            centers[label].add_sample(*px);
        }
        for center in &mut centers {
            center.update_centroid();
        }

        let new_labels: Vec<usize> = pixels.iter().map(|p| nearest(&centers, *p)).collect();
        let changed = new_labels.iter().zip(labels.iter()).filter(|(a, b)| a != b).count();
        labels = new_labels;

        if changed == 0 {
            break;
        }
    }

    let mut members = vec![0usize; centers.len()];
    for &label in &labels {
        members[label] += 1;
    }

    centers
        .iter()
        .zip(members)
        .map(|(center, members)| Cluster {
            centroid: center.rgb,
            members,
        })
        .collect()
}
