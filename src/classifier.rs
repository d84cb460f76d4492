// Spectrogram classification boundary
// The trained model is an external collaborator; this core fixes only the
// shape contract (a configured-dimensions spectrogram in, label index out)
// and ships a distance-based baseline for wiring and tests.

use crate::config::SpectrogramConfig;
use crate::dataset::Dataset;
use crate::dsp::Spectrogram;

/// Consumes a spectrogram shaped exactly to the configured dimensions and
/// returns a label index. Keeping the configured dimensions consistent
/// with whatever the implementation was trained on is the caller's
/// responsibility; a mismatch is a wiring error this core cannot detect.
pub trait Classifier {
    fn classify(&self, spectrogram: &Spectrogram) -> usize;
}

struct Centroid {
    label: String,
    mean: Vec<f32>,
}

/// Baseline classifier: one mean spectrogram per label, nearest centroid
/// by Euclidean distance. Label indices follow the dataset's label order
/// at fit time.
pub struct NearestCentroid {
    centroids: Vec<Centroid>,
}

impl NearestCentroid {
    /// Compute per-label mean spectrograms from every sample in the
    /// dataset under the given config. Labels with no samples are skipped
    /// since they have no centroid to match against.
    pub fn fit(dataset: &mut Dataset, config: &SpectrogramConfig, sample_rate: u32) -> Self {
        let labels: Vec<String> = dataset.labels().to_vec();
        let mut centroids = Vec::new();

        for label in labels {
            let count = dataset.count_for(&label).unwrap_or(0);
            if count == 0 {
                continue;
            }

            let mut mean = vec![0.0f32; config.bands * config.timesteps];
            for index in 0..count {
                let sample = dataset
                    .get_sample_mut(&label, index)
                    .expect("bucket counts match population");
                let spec = sample.spectrogram(config, sample_rate);
                for (acc, &v) in mean.iter_mut().zip(spec.values()) {
                    *acc += v;
                }
            }
            for v in mean.iter_mut() {
                *v /= count as f32;
            }

            centroids.push(Centroid { label, mean });
        }

        NearestCentroid { centroids }
    }

    /// The label a given index maps to.
    pub fn label_at(&self, index: usize) -> Option<&str> {
        self.centroids.get(index).map(|c| c.label.as_str())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.centroids.iter().map(|c| c.label.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }
}

impl Classifier for NearestCentroid {
    fn classify(&self, spectrogram: &Spectrogram) -> usize {
        let mut best = 0;
        let mut best_distance = f32::INFINITY;

        for (index, centroid) in self.centroids.iter().enumerate() {
            let distance = euclidean(spectrogram.values(), &centroid.mean);
            if distance < best_distance {
                best_distance = distance;
                best = index;
            }
        }

        best
    }
}

fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}
