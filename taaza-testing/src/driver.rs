use std::path::PathBuf;

use clap::Parser;
use log::info;

use taaza_logic::{
    AcquisitionTimeouts, Coordinate, LocationManager, ResolvedLocation, SavedAddress,
    ServiceRegistry,
};
use taaza_test_shared::{
    MemoryStore, RecordingSender, Scenario, ScenarioStep, ScriptedGeocoder, ScriptedPermission,
    ScriptedPlace, ScriptedSensor, StepOutcome, prelude::*,
};

/// Drive a scenario file through a real location manager wired to scripted
/// providers, printing one JSON outcome per step. Lets QA exercise the
/// acquisition flows without a device.
#[derive(Parser)]
struct Cli {
    /// Path to the scenario JSON file to execute
    scenario: PathBuf,

    /// Freeze tokio time so hanging-provider scenarios resolve their
    /// timeouts instantly
    #[arg(long)]
    paused_time: bool,
}

type DriverManager = LocationManager<
    ScriptedPermission,
    ScriptedSensor,
    ScriptedGeocoder,
    MemoryStore,
    RecordingSender,
>;

fn place_to_location(place: &ScriptedPlace) -> ResolvedLocation {
    ResolvedLocation::manual(
        Coordinate::new(place.latitude, place.longitude),
        place.area.clone(),
        place.city.clone(),
        place.state.clone(),
        place.postal_code.clone(),
    )
}

async fn apply_step(manager: &DriverManager, step: &ScenarioStep) -> Result {
    match step {
        ScenarioStep::Acquire => {
            let resolved = manager.acquire_current_location().await?;
            info!("Acquired {}", resolved.formatted_address);
        }
        ScenarioStep::RequestPermission => {
            let granted = manager.request_permission().await?;
            info!("Permission granted: {granted}");
        }
        ScenarioStep::SetManualLocation(place) => {
            manager.set_manual_location(place_to_location(place)).await?;
        }
        ScenarioStep::SaveAddress { kind, label, place } => {
            let address = SavedAddress::new(*kind, label.clone(), place_to_location(place));
            manager.save_address(address).await?;
        }
        ScenarioStep::RemoveAddress { label } => {
            let id = manager
                .saved_addresses()
                .await
                .iter()
                .find(|address| address.label == *label)
                .map(|address| address.id)
                .ok_or_else(|| anyhow!("No saved address labeled {label:?}"))?;
            manager.remove_address(id).await?;
        }
    }
    Ok(())
}

async fn run_scenario(scenario: Scenario) -> Result {
    let updates = RecordingSender::default();
    let manager = DriverManager::initialize(
        AcquisitionTimeouts::default(),
        ServiceRegistry::default(),
        ScriptedPermission(scenario.permission),
        ScriptedSensor(scenario.sensor.clone()),
        ScriptedGeocoder(scenario.geocoder.clone()),
        MemoryStore::default(),
        updates.clone(),
    )
    .await
    .map_err(|why| anyhow!("Failed to initialize manager: {why}"))?;

    for (step, request) in scenario.steps.iter().enumerate() {
        let error = apply_step(&manager, request).await.err();
        let outcome = StepOutcome {
            step,
            error: error.map(|why| why.to_string()),
            updates_sent: updates.count(),
            state: manager.ui_state().await,
        };
        println!(
            "{}",
            serde_json::to_string(&outcome).context("Failed to encode outcome")?
        );
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    colog::init();

    let cli = Cli::parse();
    if cli.paused_time {
        tokio::time::pause();
    }

    let raw = std::fs::read_to_string(&cli.scenario).context("Failed to read scenario file")?;
    let scenario: Scenario = serde_json::from_str(&raw).context("Failed to parse scenario")?;

    info!("Running {} steps", scenario.steps.len());
    run_scenario(scenario).await
}
