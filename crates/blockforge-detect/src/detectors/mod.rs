//! Reference detectors.

mod connected;
mod cons_class;

#[cfg(test)]
mod tests;

use blockforge_config::DetectorConfig;

use crate::detector::Detector;

pub use connected::ConnectedDetector;
pub use cons_class::ConsClassDetector;

/// Builds the configured detectors, in order.
///
/// An empty configuration yields the default chain: constraint classes,
/// then connected components.
pub fn build_detectors(configs: &[DetectorConfig]) -> Vec<Box<dyn Detector>> {
    if configs.is_empty() {
        return vec![
            Box::new(ConsClassDetector::default()),
            Box::new(ConnectedDetector),
        ];
    }
    configs
        .iter()
        .map(|config| -> Box<dyn Detector> {
            match config {
                DetectorConfig::Connected => Box::new(ConnectedDetector),
                DetectorConfig::ConsClass(cfg) => Box::new(ConsClassDetector::new(*cfg)),
            }
        })
        .collect()
}
