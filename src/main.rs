// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::time::Duration;

use anyhow::{bail, Context};
use kiln::config::load_and_validate_config;
use kiln::engine::{DeviceSelection, Engine, EngineEvent};
use kiln::traits::ExperimentService;
use tracing_subscriber::EnvFilter;

const DEFAULT_RUN_SECONDS: u64 = 3;
const VIEWPORT_WIDTH: u32 = 640;
const VIEWPORT_HEIGHT: u32 = 480;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <config.yaml> <workload> [seconds]", args[0]);
        eprintln!("Example: {} configs/kiln.yaml SlowLoad 5", args[0]);
        std::process::exit(1);
    }

    let config = load_and_validate_config(&args[1])
        .with_context(|| format!("loading {}", args[1]))?;
    let seconds = match args.get(3) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid duration '{}'", raw))?,
        None => DEFAULT_RUN_SECONDS,
    };

    let engine = Engine::builder().with_config(config).start()?;
    let result = run(&engine, &args[2], Duration::from_secs(seconds)).await;
    engine.shutdown().await;
    result
}

async fn run(service: &dyn ExperimentService, workload: &str, duration: Duration) -> anyhow::Result<()> {
    let devices = service.list_devices().await?;
    println!("{}", serde_json::to_string_pretty(&devices)?);

    let selection = match (service.device_selection_snapshot(), devices.first()) {
        (Some(saved), _) => saved,
        (None, Some(first)) => DeviceSelection::from(first),
        (None, None) => bail!("no devices available"),
    };
    if service.set_device(selection.clone()).await?.is_none() {
        bail!("device '{}' is not available", selection.name);
    }

    let mut events = service.events();
    service.set_viewport_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT).await?;
    if !service.select_workload(workload).await? {
        bail!(
            "unknown workload '{}', available: {}",
            workload,
            service.list_workloads().join(", ")
        );
    }

    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);
    let mut frames = 0u64;
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            event = events.recv() => match event {
                Some(EngineEvent::BufferReady { .. }) => frames += 1,
                Some(EngineEvent::WorkloadLifecycle { status, progress, message }) => {
                    println!("{:?} {:>5.1}% {}", status, progress * 100.0, message);
                }
                Some(EngineEvent::WorkloadError(error)) => println!("workload error: {}", error),
                Some(_) => {}
                None => break,
            },
        }
    }

    println!(
        "{} frames in {:?}, last frame took {:?}",
        frames,
        duration,
        service.frame_time_snapshot()
    );
    Ok(())
}
