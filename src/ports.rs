use crate::error::TrackerError;

/// Presentation sink for the selected asset.
pub trait DisplayPort: Send {
    fn show(&mut self, asset: &str, price: f64, delta: f64);
}

/// Absolute-position actuator driven by a pulse width in microseconds.
pub trait ActuatorPort: Send {
    fn set(&mut self, pulse_us: u32) -> Result<(), TrackerError>;
    /// Stop holding the current position.
    fn stop(&mut self) -> Result<(), TrackerError>;
    /// Release the underlying hardware handle.
    fn release(&mut self) -> Result<(), TrackerError>;
}
