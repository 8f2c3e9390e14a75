//! Flat row-major grids shared by every stage of the engine.
//!
//! `Grid<T>` is deliberately minimal: a width/height pair over a `Vec`,
//! with no stride tricks and no interior mutability. Images, masks and
//! label matrices are all aliases of it.

use serde::{Deserialize, Serialize};

/// A dense row-major 2-D grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

/// Real-valued intensities, conventionally normalized to [0, 1].
pub type Image = Grid<f64>;

/// `true` marks pixels eligible for statistics.
pub type Mask = Grid<bool>;

/// Non-negative labels; 0 is background, 1..=N identify objects.
pub type LabelMatrix = Grid<u32>;

impl<T> Grid<T> {
    /// Build a grid filled with copies of `fill`.
    pub fn new(width: usize, height: usize, fill: T) -> Self
    where
        T: Clone,
    {
        Self {
            width,
            height,
            data: vec![fill; width * height],
        }
    }

    /// Build a grid from a row-major buffer. Returns `None` when the
    /// buffer length does not match `width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Option<Self> {
        if data.len() != width * height {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn idx(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.height && col < self.width);
        row * self.width + col
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> &T {
        &self.data[self.idx(row, col)]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        let i = self.idx(row, col);
        self.data[i] = value;
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Whether `other` has exactly the same dimensions.
    pub fn same_shape<U>(&self, other: &Grid<U>) -> bool {
        self.width == other.width && self.height == other.height
    }
}

impl Mask {
    /// An all-eligible mask (absence of a mask means "all pixels count").
    pub fn all_true(width: usize, height: usize) -> Self {
        Self::new(width, height, true)
    }

    pub fn any(&self) -> bool {
        self.data.iter().any(|&m| m)
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&m| m).count()
    }
}

impl LabelMatrix {
    /// Highest label present (0 when the matrix is all background).
    pub fn max_label(&self) -> u32 {
        self.data.iter().copied().max().unwrap_or(0)
    }
}

/// Half-open pixel rectangle: rows `row0..row1`, columns `col0..col1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub row0: usize,
    pub row1: usize,
    pub col0: usize,
    pub col1: usize,
}

/// Collect the masked intensities as a flat sample.
pub fn masked_values(image: &Image, mask: &Mask) -> Vec<f64> {
    debug_assert!(image.same_shape(mask));
    image
        .data()
        .iter()
        .zip(mask.data())
        .filter_map(|(&v, &m)| m.then_some(v))
        .collect()
}

/// Bounding box of every label `1..=max_label`, indexed by `label - 1`.
/// Labels with no pixels yield `None`.
pub fn label_bounding_boxes(labels: &LabelMatrix) -> Vec<Option<BoundingBox>> {
    let n = labels.max_label() as usize;
    let mut boxes: Vec<Option<BoundingBox>> = vec![None; n];
    for row in 0..labels.height() {
        for col in 0..labels.width() {
            let label = *labels.get(row, col);
            if label == 0 {
                continue;
            }
            let entry = &mut boxes[label as usize - 1];
            match entry {
                None => {
                    *entry = Some(BoundingBox {
                        row0: row,
                        row1: row + 1,
                        col0: col,
                        col1: col + 1,
                    });
                }
                Some(b) => {
                    b.row0 = b.row0.min(row);
                    b.row1 = b.row1.max(row + 1);
                    b.col0 = b.col0.min(col);
                    b.col1 = b.col1.max(col + 1);
                }
            }
        }
    }
    boxes
}

/// Unweighted (row, col) center of mass of every label `1..=max_label`.
/// Labels with no pixels yield `(NaN, NaN)`.
pub fn label_centroids(labels: &LabelMatrix) -> Vec<(f64, f64)> {
    let n = labels.max_label() as usize;
    let mut row_sum = vec![0.0f64; n];
    let mut col_sum = vec![0.0f64; n];
    let mut count = vec![0usize; n];
    for row in 0..labels.height() {
        for col in 0..labels.width() {
            let label = *labels.get(row, col);
            if label == 0 {
                continue;
            }
            let k = label as usize - 1;
            row_sum[k] += row as f64;
            col_sum[k] += col as f64;
            count[k] += 1;
        }
    }
    (0..n)
        .map(|k| {
            if count[k] == 0 {
                (f64::NAN, f64::NAN)
            } else {
                (row_sum[k] / count[k] as f64, col_sum[k] / count[k] as f64)
            }
        })
        .collect()
}
