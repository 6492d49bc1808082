use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use crate::delta::DeltaCalculator;
use crate::error::TrackerError;
use crate::feed::PriceSource;
use crate::history::HistoryStore;
use crate::mapper::PositionMapper;
use crate::ports::{ActuatorPort, DisplayPort};
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Running,
    ShuttingDown,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct TrackerSettings {
    pub assets: Vec<String>,
    pub fiat: String,
    pub depth: usize,
    pub window_ticks: usize,
    pub tick_interval: Duration,
}

/// Read-only view of the controller, assets in configured order.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerSnapshot {
    pub state: ControllerState,
    pub selected: usize,
    pub selected_asset: String,
    pub deltas: Vec<(String, f64)>,
    pub history_lens: Vec<(String, usize)>,
    pub ticks: u64,
}

/// Owns every piece of mutable tracker state. Ticks, selection changes and
/// shutdown all go through `&mut self`, so a render never sees a half-applied tick.
pub struct TrackerController<S, D, A>
where
    S: PriceSource,
    D: DisplayPort,
    A: ActuatorPort,
{
    assets: Vec<String>,
    fiat: String,
    tick_interval: Duration,
    history: HistoryStore,
    calculator: DeltaCalculator,
    mapper: PositionMapper,
    retry: RetryPolicy,
    deltas: HashMap<String, f64>,
    selected: usize,
    state: ControllerState,
    ticks: u64,
    source: S,
    display: D,
    actuator: A,
}

impl<S, D, A> TrackerController<S, D, A>
where
    S: PriceSource,
    D: DisplayPort,
    A: ActuatorPort,
{
    pub fn new(
        settings: TrackerSettings,
        mapper: PositionMapper,
        retry: RetryPolicy,
        source: S,
        display: D,
        actuator: A,
    ) -> Result<Self, TrackerError> {
        if settings.assets.is_empty() {
            return Err(TrackerError::PriceFeed("no assets to track".to_string()));
        }
        if settings.depth < settings.window_ticks {
            tracing::warn!(
                depth = settings.depth,
                window_ticks = settings.window_ticks,
                "History depth is shorter than the window; deltas will cover at most depth samples"
            );
        }
        let deltas = settings.assets.iter().map(|a| (a.clone(), 0.0)).collect();
        Ok(Self {
            history: HistoryStore::new(&settings.assets, settings.depth),
            calculator: DeltaCalculator::new(settings.window_ticks),
            assets: settings.assets,
            fiat: settings.fiat,
            tick_interval: settings.tick_interval,
            mapper,
            retry,
            deltas,
            selected: 0,
            state: ControllerState::Idle,
            ticks: 0,
            source,
            display,
            actuator,
        })
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn delta(&self, asset: &str) -> Option<f64> {
        self.deltas.get(asset).copied()
    }

    pub fn selected_asset(&self) -> &str {
        &self.assets[self.selected]
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            state: self.state,
            selected: self.selected,
            selected_asset: self.selected_asset().to_string(),
            deltas: self
                .assets
                .iter()
                .map(|a| (a.clone(), self.deltas.get(a).copied().unwrap_or(0.0)))
                .collect(),
            history_lens: self
                .assets
                .iter()
                .map(|a| (a.clone(), self.history.len(a)))
                .collect(),
            ticks: self.ticks,
        }
    }

    /// Idle -> Running. Parks the actuator at level.
    pub fn start(&mut self) -> Result<(), TrackerError> {
        if self.state != ControllerState::Idle {
            return Ok(());
        }
        self.actuator.set(self.mapper.level_pulse())?;
        self.state = ControllerState::Running;
        tracing::info!(
            assets = ?self.assets,
            fiat = %self.fiat,
            window_ticks = self.calculator.window_ticks(),
            depth = self.history.depth(),
            "Tracker running"
        );
        Ok(())
    }

    /// One full cycle: fetch (with retry), append and recompute every asset, render.
    /// Returns `Ok(false)` when the retry policy gave up and the tick was skipped.
    pub async fn tick(&mut self) -> Result<bool, TrackerError> {
        match fetch_all(&self.source, &self.assets, &self.fiat, self.retry).await {
            Ok(prices) => {
                self.apply_prices(&prices)?;
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Skipping tick, keeping last known values");
                Ok(false)
            }
        }
    }

    /// Synchronous half of a tick. Every asset must be present, otherwise nothing is appended.
    pub fn apply_prices(&mut self, prices: &HashMap<String, f64>) -> Result<(), TrackerError> {
        if let Some(missing) = self.assets.iter().find(|a| !prices.contains_key(*a)) {
            return Err(TrackerError::MissingPrice {
                asset: missing.clone(),
                fiat: self.fiat.clone(),
            });
        }

        for asset in &self.assets {
            self.history.append(asset, prices[asset])?;
            match self.calculator.compute(&self.history, asset) {
                Ok(delta) => {
                    self.deltas.insert(asset.clone(), delta);
                }
                Err(TrackerError::DegenerateDelta { .. }) => {
                    tracing::warn!(asset = %asset, "Newest price is zero, keeping previous delta");
                }
                Err(e) => return Err(e),
            }
        }
        self.ticks += 1;
        tracing::info!(tick = self.ticks, ?prices, deltas = ?self.deltas, "Tick applied");

        self.render()
    }

    /// Advance the selection and re-render from stored values. No fetch, no history change.
    pub fn select_next(&mut self) -> Result<(), TrackerError> {
        if matches!(
            self.state,
            ControllerState::ShuttingDown | ControllerState::Stopped
        ) {
            return Ok(());
        }
        self.selected = (self.selected + 1) % self.assets.len();
        tracing::info!(asset = %self.selected_asset(), "Selection changed");
        self.render()
    }

    fn render(&mut self) -> Result<(), TrackerError> {
        let asset = &self.assets[self.selected];
        let delta = self.deltas.get(asset).copied().unwrap_or(0.0);
        if let Ok(price) = self.history.latest(asset) {
            self.display.show(asset, price, delta);
        }
        let band = self.mapper.map(delta);
        let pulse = self.mapper.pulse(band);
        tracing::debug!(asset = %asset, delta, band = %band, pulse, "Actuator update");
        self.actuator.set(pulse)
    }

    /// Stop and release the actuator. Runs at most once; later calls are no-ops.
    pub fn shutdown(&mut self) {
        if matches!(
            self.state,
            ControllerState::ShuttingDown | ControllerState::Stopped
        ) {
            return;
        }
        self.state = ControllerState::ShuttingDown;
        if let Err(e) = self.actuator.stop() {
            tracing::warn!(error = %e, "Actuator stop failed");
        }
        if let Err(e) = self.actuator.release() {
            tracing::warn!(error = %e, "Actuator release failed");
        }
        self.state = ControllerState::Stopped;
        tracing::info!(ticks = self.ticks, "Tracker stopped");
    }

    /// Tick loop. Waits on the next tick, a selection event or shutdown, whichever comes first.
    pub async fn run(
        mut self,
        mut select_rx: mpsc::Receiver<()>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), TrackerError> {
        self.start()?;

        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !*shutdown.borrow() {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    let ticked = tokio::select! {
                        res = self.tick() => Some(res),
                        _ = shutdown.changed() => None,
                    };
                    match ticked {
                        Some(res) => {
                            res?;
                        }
                        None => break,
                    }
                }
                Some(()) = select_rx.recv() => self.select_next()?,
            }
        }

        self.shutdown();
        Ok(())
    }
}

impl<S, D, A> Drop for TrackerController<S, D, A>
where
    S: PriceSource,
    D: DisplayPort,
    A: ActuatorPort,
{
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn fetch_all<S: PriceSource>(
    source: &S,
    assets: &[String],
    fiat: &str,
    retry: RetryPolicy,
) -> anyhow::Result<HashMap<String, f64>> {
    retry
        .run("fetch_prices", || async move {
            let prices = source.fetch_prices(assets, fiat).await?;
            if let Some(missing) = assets.iter().find(|a| !prices.contains_key(*a)) {
                return Err(TrackerError::MissingPrice {
                    asset: missing.clone(),
                    fiat: fiat.to_string(),
                }
                .into());
            }
            Ok::<_, anyhow::Error>(prices)
        })
        .await
}
