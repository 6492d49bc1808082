mod common;

use std::time::Duration;

use tokio::sync::{mpsc, watch};

use coin_coaster::controller::ControllerState;
use coin_coaster::retry::RetryPolicy;

use common::{controller, prices, ScriptedSource};

fn no_delay() -> RetryPolicy {
    RetryPolicy::forever(Duration::ZERO)
}

#[tokio::test]
async fn start_parks_actuator_at_level() {
    let (mut c, display, actuator) = controller(&["BTC", "LTC"], ScriptedSource::default(), no_delay());
    assert_eq!(c.state(), ControllerState::Idle);
    c.start().unwrap();
    c.start().unwrap();
    assert_eq!(c.state(), ControllerState::Running);
    assert_eq!(actuator.pulses(), vec![1350]);
    assert!(display.shows().is_empty());
}

#[tokio::test]
async fn tick_updates_every_asset_and_renders_selected() {
    let source = ScriptedSource::new(vec![
        Ok(prices(&[("BTC", 100.0), ("LTC", 50.0)])),
        Ok(prices(&[("BTC", 110.0), ("LTC", 49.0)])),
    ]);
    let (mut c, display, actuator) = controller(&["BTC", "LTC"], source, no_delay());
    c.start().unwrap();

    assert!(c.tick().await.unwrap());
    assert_eq!(c.delta("BTC"), Some(0.0));
    assert_eq!(display.shows(), vec![("BTC".to_string(), 100.0, 0.0)]);

    assert!(c.tick().await.unwrap());
    let btc = c.delta("BTC").unwrap();
    let ltc = c.delta("LTC").unwrap();
    assert!((btc - 9.09).abs() < 1e-9);
    assert!((ltc - -2.04).abs() < 1e-9);
    assert_eq!(c.history().len("LTC"), 2);
    assert_eq!(display.last_asset().as_deref(), Some("BTC"));
    assert_eq!(actuator.last_pulse(), Some(2300));
}

#[tokio::test]
async fn select_next_cycles_back_to_start() {
    let source = ScriptedSource::new(vec![Ok(prices(&[
        ("BTC", 100.0),
        ("LTC", 50.0),
        ("ETH", 10.0),
    ]))]);
    let (mut c, display, _actuator) = controller(&["BTC", "LTC", "ETH"], source, no_delay());
    c.start().unwrap();
    c.tick().await.unwrap();

    let mut seen = Vec::new();
    for _ in 0..3 {
        c.select_next().unwrap();
        seen.push(c.selected_asset().to_string());
    }
    assert_eq!(seen, vec!["LTC", "ETH", "BTC"]);
    assert_eq!(c.snapshot().selected, 0);

    let shown: Vec<String> = display.shows().into_iter().map(|(a, _, _)| a).collect();
    assert_eq!(shown, vec!["BTC", "LTC", "ETH", "BTC"]);
}

#[tokio::test]
async fn select_next_does_not_touch_history_or_deltas() {
    let source = ScriptedSource::new(vec![
        Ok(prices(&[("BTC", 100.0), ("LTC", 50.0)])),
        Ok(prices(&[("BTC", 99.0), ("LTC", 51.0)])),
    ]);
    let (mut c, _display, actuator) = controller(&["BTC", "LTC"], source.clone(), no_delay());
    c.start().unwrap();
    c.tick().await.unwrap();
    c.tick().await.unwrap();

    let before = c.snapshot();
    let btc_before: Vec<f64> = c.history().samples("BTC").collect();
    c.select_next().unwrap();
    let after = c.snapshot();

    assert_eq!(before.deltas, after.deltas);
    assert_eq!(before.history_lens, after.history_lens);
    assert_eq!(before.ticks, after.ticks);
    assert_eq!(btc_before, c.history().samples("BTC").collect::<Vec<_>>());
    assert_eq!(after.selected_asset, "LTC");
    assert_eq!(source.calls(), 2);
    // LTC moved +1.96% -> up90
    assert_eq!(actuator.last_pulse(), Some(2300));
}

#[tokio::test]
async fn select_before_first_tick_only_moves_actuator() {
    let (mut c, display, actuator) = controller(&["BTC", "LTC"], ScriptedSource::default(), no_delay());
    c.start().unwrap();
    c.select_next().unwrap();
    assert_eq!(c.selected_asset(), "LTC");
    assert!(display.shows().is_empty());
    assert_eq!(actuator.pulses(), vec![1350, 1350]);
}

#[tokio::test(start_paused = true)]
async fn retried_fetch_appends_exactly_once() {
    let source = ScriptedSource::new(vec![
        Err("connection refused".to_string()),
        Err("timeout".to_string()),
        Err("bad gateway".to_string()),
        Ok(prices(&[("BTC", 100.0), ("LTC", 50.0)])),
    ]);
    let (mut c, _display, _actuator) = controller(
        &["BTC", "LTC"],
        source.clone(),
        RetryPolicy::forever(Duration::from_secs(10)),
    );
    c.start().unwrap();

    assert!(c.tick().await.unwrap());
    assert_eq!(source.calls(), 4);
    assert_eq!(c.history().len("BTC"), 1);
    assert_eq!(c.history().len("LTC"), 1);
    assert_eq!(c.snapshot().ticks, 1);
}

#[tokio::test]
async fn partial_response_is_retried_not_half_applied() {
    let source = ScriptedSource::new(vec![
        Ok(prices(&[("BTC", 100.0)])),
        Ok(prices(&[("BTC", 101.0), ("LTC", 50.0)])),
    ]);
    let (mut c, _display, _actuator) = controller(&["BTC", "LTC"], source.clone(), no_delay());
    c.start().unwrap();

    assert!(c.tick().await.unwrap());
    assert_eq!(source.calls(), 2);
    assert_eq!(c.history().samples("BTC").collect::<Vec<_>>(), vec![101.0]);
    assert_eq!(c.history().len("LTC"), 1);
}

#[tokio::test]
async fn exhausted_retry_skips_tick_and_keeps_state() {
    let source = ScriptedSource::new(vec![
        Ok(prices(&[("BTC", 100.0), ("LTC", 50.0)])),
        Err("down".to_string()),
    ]);
    let (mut c, display, _actuator) = controller(
        &["BTC", "LTC"],
        source.clone(),
        RetryPolicy::bounded(2, Duration::ZERO),
    );
    c.start().unwrap();
    assert!(c.tick().await.unwrap());
    let before = c.snapshot();

    assert!(!c.tick().await.unwrap());
    assert_eq!(source.calls(), 3);
    assert_eq!(c.snapshot(), before);
    assert_eq!(display.shows().len(), 1);
}

#[tokio::test]
async fn zero_price_keeps_previous_delta() {
    let source = ScriptedSource::new(vec![
        Ok(prices(&[("BTC", 100.0)])),
        Ok(prices(&[("BTC", 110.0)])),
        Ok(prices(&[("BTC", 0.0)])),
    ]);
    let (mut c, display, _actuator) = controller(&["BTC"], source, no_delay());
    c.start().unwrap();
    for _ in 0..3 {
        assert!(c.tick().await.unwrap());
    }
    assert_eq!(c.history().len("BTC"), 3);
    assert!((c.delta("BTC").unwrap() - 9.09).abs() < 1e-9);
    let (_, price, _) = display.shows().last().cloned().unwrap();
    assert_eq!(price, 0.0);
}

#[tokio::test]
async fn shutdown_runs_once() {
    let (mut c, _display, actuator) = controller(&["BTC"], ScriptedSource::default(), no_delay());
    c.start().unwrap();
    c.shutdown();
    c.shutdown();
    assert_eq!(c.state(), ControllerState::Stopped);
    c.select_next().unwrap();
    assert_eq!(actuator.pulses(), vec![1350]);

    drop(c);
    assert_eq!(actuator.stops(), 1);
    assert_eq!(actuator.releases(), 1);
}

#[tokio::test]
async fn drop_releases_actuator() {
    let (mut c, _display, actuator) = controller(&["BTC"], ScriptedSource::default(), no_delay());
    c.start().unwrap();
    drop(c);
    assert_eq!(actuator.stops(), 1);
    assert_eq!(actuator.releases(), 1);
}

#[tokio::test(start_paused = true)]
async fn run_ticks_on_interval_and_handles_select() {
    let source = ScriptedSource::new(vec![Ok(prices(&[("BTC", 100.0), ("LTC", 50.0)]))]);
    let (c, display, actuator) = controller(&["BTC", "LTC"], source.clone(), no_delay());
    let (select_tx, select_rx) = mpsc::channel(1);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(c.run(select_rx, shutdown_rx));

    // ticks at t=0, 5m, 10m
    tokio::time::sleep(Duration::from_secs(11 * 60)).await;
    assert_eq!(source.calls(), 3);

    select_tx.send(()).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(display.last_asset().as_deref(), Some("LTC"));
    assert_eq!(source.calls(), 3);

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap().unwrap();
    assert_eq!(actuator.releases(), 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_interrupts_fetch_retry() {
    let source = ScriptedSource::new(vec![Err("offline".to_string())]);
    let (c, display, actuator) = controller(
        &["BTC"],
        source.clone(),
        RetryPolicy::forever(Duration::from_secs(10)),
    );
    let (_select_tx, select_rx) = mpsc::channel(1);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(c.run(select_rx, shutdown_rx));
    tokio::time::sleep(Duration::from_secs(25)).await;
    assert_eq!(source.calls(), 3);

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap().unwrap();
    assert!(display.shows().is_empty());
    assert_eq!(actuator.stops(), 1);
    assert_eq!(actuator.releases(), 1);
}

#[tokio::test(start_paused = true)]
async fn run_retries_partial_response_before_applying() {
    let source = ScriptedSource::new(vec![
        Ok(prices(&[("BTC", 100.0)])),
        Ok(prices(&[("BTC", 101.0), ("LTC", 50.0)])),
    ]);
    let (c, display, _actuator) = controller(
        &["BTC", "LTC"],
        source.clone(),
        RetryPolicy::forever(Duration::from_secs(10)),
    );
    let (_select_tx, select_rx) = mpsc::channel(1);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(c.run(select_rx, shutdown_rx));
    tokio::time::sleep(Duration::from_secs(15)).await;
    assert_eq!(source.calls(), 2);
    assert_eq!(display.shows(), vec![("BTC".to_string(), 101.0, 0.0)]);

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap().unwrap();
}
