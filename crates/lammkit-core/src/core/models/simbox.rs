use nalgebra::Vector3;

/// Simulation box bounds.
///
/// Three `(lo, hi)` intervals plus the triclinic tilt factors `(xy, xz, yz)`.
/// A tilt of exactly zero is the orthogonal-box state and is omitted when the
/// box is written out.
#[derive(Debug, Clone, PartialEq)]
pub struct SimBox {
    pub x: (f64, f64),
    pub y: (f64, f64),
    pub z: (f64, f64),
    /// Triclinic shear `(xy, xz, yz)`.
    pub tilt: Vector3<f64>,
}

impl SimBox {
    pub fn is_triclinic(&self) -> bool {
        self.tilt != Vector3::zeros()
    }
}

impl Default for SimBox {
    fn default() -> Self {
        Self {
            x: (0.0, 0.0),
            y: (0.0, 0.0),
            z: (0.0, 0.0),
            tilt: Vector3::zeros(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_box_is_orthogonal() {
        assert!(!SimBox::default().is_triclinic());
    }

    #[test]
    fn any_nonzero_tilt_makes_the_box_triclinic() {
        let mut simbox = SimBox::default();
        simbox.tilt = Vector3::new(0.0, 0.0, 1.5);
        assert!(simbox.is_triclinic());
    }
}
