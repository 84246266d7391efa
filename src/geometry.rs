//! Explicit detector geometry context.
//!
//! The finder never consults global state for geometry: the layer→superlayer
//! layout, the layer radii and the conformal reference point are carried by a
//! [`DetectorGeometry`] value that is passed by reference to the stages that
//! need it.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Layered description of a cylindrical wire chamber.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorGeometry {
    /// Number of layers in each superlayer, innermost first.
    pub layers_per_superlayer: Vec<u16>,
    /// Sense-wire radius of every layer (cm), innermost first.
    pub layer_radii: Vec<f64>,
    /// Number of sense wires in each layer.
    pub wires_per_layer: Vec<u16>,
    /// Superlayers whose wires are tilted with respect to the beam axis.
    pub stereo_superlayers: Vec<u8>,
    /// Reference point of the conformal transform (beam spot, cm).
    pub reference_point: [f64; 2],
}

impl Default for DetectorGeometry {
    fn default() -> Self {
        // Nine superlayers: eight layers in the innermost one, six in the rest,
        // alternating axial and stereo orientation.
        let layers_per_superlayer = vec![8, 6, 6, 6, 6, 6, 6, 6, 6];
        let wires_per_superlayer = [160u16, 160, 192, 224, 256, 288, 320, 352, 384];
        let mut layer_radii = Vec::new();
        let mut wires_per_layer = Vec::new();
        let mut radius = 16.8;
        for (sl, &layers) in layers_per_superlayer.iter().enumerate() {
            for _ in 0..layers {
                layer_radii.push(radius);
                wires_per_layer.push(wires_per_superlayer[sl]);
                radius += 1.0;
            }
            radius += 2.0;
        }
        Self {
            layers_per_superlayer,
            layer_radii,
            wires_per_layer,
            stereo_superlayers: vec![1, 3, 5, 7],
            reference_point: [0.0, 0.0],
        }
    }
}

impl DetectorGeometry {
    /// Number of superlayers.
    pub fn superlayer_count(&self) -> usize {
        self.layers_per_superlayer.len()
    }

    /// Total number of layers.
    pub fn layer_count(&self) -> usize {
        self.layers_per_superlayer
            .iter()
            .map(|&n| n as usize)
            .sum()
    }

    /// Superlayer containing `layer`, or `None` when the layer is unknown.
    pub fn superlayer_of(&self, layer: u16) -> Option<u8> {
        let mut first = 0u32;
        for (sl, &n) in self.layers_per_superlayer.iter().enumerate() {
            let last = first + n as u32;
            if (layer as u32) < last {
                return Some(sl as u8);
            }
            first = last;
        }
        None
    }

    /// First (innermost) layer id of a superlayer.
    pub fn first_layer(&self, superlayer: u8) -> Option<u16> {
        if superlayer as usize >= self.layers_per_superlayer.len() {
            return None;
        }
        let first: u32 = self.layers_per_superlayer[..superlayer as usize]
            .iter()
            .map(|&n| n as u32)
            .sum();
        Some(first as u16)
    }

    pub fn is_axial(&self, superlayer: u8) -> bool {
        !self.stereo_superlayers.contains(&superlayer)
    }

    pub fn layer_radius(&self, layer: u16) -> Option<f64> {
        self.layer_radii.get(layer as usize).copied()
    }

    /// Checks the layout before any event is processed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layers_per_superlayer.is_empty() {
            return Err(ConfigError::InvalidGeometry(
                "at least one superlayer is required".into(),
            ));
        }
        if self.layers_per_superlayer.len() > u8::MAX as usize {
            return Err(ConfigError::InvalidGeometry(format!(
                "{} superlayers exceed the supported maximum {}",
                self.layers_per_superlayer.len(),
                u8::MAX
            )));
        }
        if let Some(sl) = self.layers_per_superlayer.iter().position(|&n| n == 0) {
            return Err(ConfigError::InvalidGeometry(format!(
                "superlayer {sl} has no layers"
            )));
        }
        let layers = self.layer_count();
        if self.layer_radii.len() != layers {
            return Err(ConfigError::InvalidGeometry(format!(
                "{} layer radii given for {layers} layers",
                self.layer_radii.len()
            )));
        }
        if self.wires_per_layer.len() != layers {
            return Err(ConfigError::InvalidGeometry(format!(
                "{} wire counts given for {layers} layers",
                self.wires_per_layer.len()
            )));
        }
        if self
            .layer_radii
            .windows(2)
            .any(|w| !(w[0].is_finite() && w[1].is_finite() && w[0] < w[1]))
        {
            return Err(ConfigError::InvalidGeometry(
                "layer radii must be finite and strictly increasing".into(),
            ));
        }
        if self.layer_radii.first().map_or(false, |&r| r <= 0.0) {
            return Err(ConfigError::InvalidGeometry(
                "layer radii must be positive".into(),
            ));
        }
        if self.wires_per_layer.iter().any(|&n| n == 0) {
            return Err(ConfigError::InvalidGeometry(
                "every layer needs at least one wire".into(),
            ));
        }
        if !(self.reference_point[0].is_finite() && self.reference_point[1].is_finite()) {
            return Err(ConfigError::InvalidGeometry(
                "reference point is not finite".into(),
            ));
        }
        Ok(())
    }
}
