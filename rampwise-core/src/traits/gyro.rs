//! Gyro heading capability

/// Integrating gyro
pub trait Gyro {
    /// Integrated heading in degrees
    ///
    /// Clockwise positive and not wrapped: two full clockwise turns read 720.
    fn heading_degrees(&mut self) -> f64;
}

impl<G: Gyro + ?Sized> Gyro for &mut G {
    fn heading_degrees(&mut self) -> f64 {
        (**self).heading_degrees()
    }
}
