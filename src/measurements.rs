//! Measurement recording for downstream consumers.
//!
//! The engine itself is pure; these helpers let a pipeline record the
//! object count and per-object centroids produced by segmentation in
//! the feature-name scheme its consumers expect (`Count_<objects>`,
//! `Location_Center_X` / `Location_Center_Y`).

use std::collections::BTreeMap;

use crate::grid::{label_centroids, LabelMatrix};

pub const FT_LOCATION_CENTER_X: &str = "Location_Center_X";
pub const FT_LOCATION_CENTER_Y: &str = "Location_Center_Y";

/// In-memory measurement store: one scalar per image-level feature, one
/// value per object for object-level features.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Measurements {
    image: BTreeMap<String, f64>,
    objects: BTreeMap<(String, String), Vec<f64>>,
}

impl Measurements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_image_measurement(&mut self, feature: &str, value: f64) {
        self.image.insert(feature.to_string(), value);
    }

    pub fn add_object_measurement(&mut self, object_name: &str, feature: &str, values: Vec<f64>) {
        self.objects
            .insert((object_name.to_string(), feature.to_string()), values);
    }

    pub fn image_measurement(&self, feature: &str) -> Option<f64> {
        self.image.get(feature).copied()
    }

    pub fn object_measurement(&self, object_name: &str, feature: &str) -> Option<&[f64]> {
        self.objects
            .get(&(object_name.to_string(), feature.to_string()))
            .map(Vec::as_slice)
    }
}

/// Record the number of objects found in the image as
/// `Count_<object_name>`.
pub fn add_object_count_measurements(
    measurements: &mut Measurements,
    object_name: &str,
    object_count: u32,
) {
    measurements.add_image_measurement(&format!("Count_{object_name}"), object_count as f64);
}

/// Record the unweighted center of mass of every label.
///
/// `Location_Center_X` carries the row coordinate and
/// `Location_Center_Y` the column coordinate; the naming is historical
/// and consumers already rely on it. A label matrix with no objects
/// records two empty sequences, not an error.
pub fn add_object_location_measurements(
    measurements: &mut Measurements,
    object_name: &str,
    labels: &LabelMatrix,
) {
    let centroids = label_centroids(labels);
    let rows: Vec<f64> = centroids.iter().map(|&(r, _)| r).collect();
    let cols: Vec<f64> = centroids.iter().map(|&(_, c)| c).collect();
    measurements.add_object_measurement(object_name, FT_LOCATION_CENTER_X, rows);
    measurements.add_object_measurement(object_name, FT_LOCATION_CENTER_Y, cols);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_object_count_per_image() {
        let mut m = Measurements::new();
        add_object_count_measurements(&mut m, "Nuclei", 17);
        assert_eq!(Some(17.0), m.image_measurement("Count_Nuclei"));
    }

    #[test]
    fn records_centroids_per_object() {
        let labels = LabelMatrix::from_vec(
            4,
            2,
            vec![
                1, 1, 0, 2, //
                1, 1, 0, 2,
            ],
        )
        .unwrap();
        let mut m = Measurements::new();
        add_object_location_measurements(&mut m, "Nuclei", &labels);
        assert_eq!(
            Some(&[0.5, 0.5][..]),
            m.object_measurement("Nuclei", FT_LOCATION_CENTER_X)
        );
        assert_eq!(
            Some(&[0.5, 3.0][..]),
            m.object_measurement("Nuclei", FT_LOCATION_CENTER_Y)
        );
    }

    #[test]
    fn zero_objects_record_empty_sequences() {
        let labels = LabelMatrix::new(3, 3, 0);
        let mut m = Measurements::new();
        add_object_location_measurements(&mut m, "Nuclei", &labels);
        assert_eq!(
            Some(&[][..]),
            m.object_measurement("Nuclei", FT_LOCATION_CENTER_X)
        );
        assert_eq!(
            Some(&[][..]),
            m.object_measurement("Nuclei", FT_LOCATION_CENTER_Y)
        );
    }
}
