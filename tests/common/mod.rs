#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use coin_coaster::controller::{TrackerController, TrackerSettings};
use coin_coaster::error::TrackerError;
use coin_coaster::feed::PriceSource;
use coin_coaster::mapper::PositionMapper;
use coin_coaster::ports::{ActuatorPort, DisplayPort};
use coin_coaster::retry::RetryPolicy;

pub type Prices = HashMap<String, f64>;

pub fn prices(pairs: &[(&str, f64)]) -> Prices {
    pairs.iter().map(|(a, p)| (a.to_string(), *p)).collect()
}

/// Price source that replays scripted responses; the last one repeats once the script runs out.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    script: Arc<Mutex<VecDeque<Result<Prices, String>>>>,
    last: Arc<Mutex<Option<Result<Prices, String>>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<Prices, String>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for ScriptedSource {
    async fn fetch_prices(&self, _assets: &[String], _fiat: &str) -> Result<Prices> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        let resp = match next {
            Some(r) => {
                *self.last.lock().unwrap() = Some(r.clone());
                r
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err("script empty".to_string())),
        };
        resp.map_err(|e| anyhow!(e))
    }
}

#[derive(Clone, Default)]
pub struct RecordingDisplay {
    pub shows: Arc<Mutex<Vec<(String, f64, f64)>>>,
}

impl RecordingDisplay {
    pub fn shows(&self) -> Vec<(String, f64, f64)> {
        self.shows.lock().unwrap().clone()
    }

    pub fn last_asset(&self) -> Option<String> {
        self.shows().last().map(|(a, _, _)| a.clone())
    }
}

impl DisplayPort for RecordingDisplay {
    fn show(&mut self, asset: &str, price: f64, delta: f64) {
        self.shows
            .lock()
            .unwrap()
            .push((asset.to_string(), price, delta));
    }
}

#[derive(Clone, Default)]
pub struct RecordingActuator {
    pub pulses: Arc<Mutex<Vec<u32>>>,
    pub stops: Arc<AtomicUsize>,
    pub releases: Arc<AtomicUsize>,
}

impl RecordingActuator {
    pub fn pulses(&self) -> Vec<u32> {
        self.pulses.lock().unwrap().clone()
    }

    pub fn last_pulse(&self) -> Option<u32> {
        self.pulses().last().copied()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl ActuatorPort for RecordingActuator {
    fn set(&mut self, pulse_us: u32) -> Result<(), TrackerError> {
        self.pulses.lock().unwrap().push(pulse_us);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), TrackerError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release(&mut self) -> Result<(), TrackerError> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub type TestController = TrackerController<ScriptedSource, RecordingDisplay, RecordingActuator>;

pub fn settings(assets: &[&str], depth: usize, window_ticks: usize) -> TrackerSettings {
    TrackerSettings {
        assets: assets.iter().map(|a| a.to_string()).collect(),
        fiat: "USD".to_string(),
        depth,
        window_ticks,
        tick_interval: Duration::from_secs(300),
    }
}

pub fn controller(
    assets: &[&str],
    source: ScriptedSource,
    retry: RetryPolicy,
) -> (TestController, RecordingDisplay, RecordingActuator) {
    let display = RecordingDisplay::default();
    let actuator = RecordingActuator::default();
    let c = TrackerController::new(
        settings(assets, 15, 12),
        PositionMapper::default(),
        retry,
        source,
        display.clone(),
        actuator.clone(),
    )
    .unwrap();
    (c, display, actuator)
}
