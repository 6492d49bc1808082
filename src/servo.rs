use std::sync::{Arc, Mutex};

use crate::error::TrackerError;
use crate::ports::ActuatorPort;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServoState {
    pub pulse_us: Option<u32>,
    pub commands: u64,
    pub stopped: bool,
    pub released: bool,
}

/// Servo stand-in that records commands instead of driving a PWM pin.
///
/// Cloning shares state, so a caller can keep a handle for inspection while the
/// controller owns another.
#[derive(Debug, Clone)]
pub struct SimulatedServo {
    pin: u8,
    state: Arc<Mutex<ServoState>>,
}

impl SimulatedServo {
    pub fn new(pin: u8) -> Self {
        Self {
            pin,
            state: Arc::new(Mutex::new(ServoState::default())),
        }
    }

    pub fn state(&self) -> ServoState {
        self.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ServoState>, TrackerError> {
        self.state
            .lock()
            .map_err(|_| TrackerError::Hardware(format!("servo {} state poisoned", self.pin)))
    }
}

impl ActuatorPort for SimulatedServo {
    fn set(&mut self, pulse_us: u32) -> Result<(), TrackerError> {
        let mut s = self.lock()?;
        if s.released {
            return Err(TrackerError::Hardware(format!(
                "servo {} already released",
                self.pin
            )));
        }
        s.pulse_us = Some(pulse_us);
        s.commands += 1;
        s.stopped = false;
        tracing::debug!(pin = self.pin, pulse_us, "Servo set");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), TrackerError> {
        let mut s = self.lock()?;
        s.stopped = true;
        tracing::info!(pin = self.pin, "Servo stopped");
        Ok(())
    }

    fn release(&mut self) -> Result<(), TrackerError> {
        let mut s = self.lock()?;
        s.released = true;
        tracing::info!(pin = self.pin, "Servo released");
        Ok(())
    }
}
