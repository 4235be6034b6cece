use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::{Vec2, Vec3};
use tracing_subscriber::EnvFilter;
use worldview_common::{Aabb2, AreaId, CameraSettingId, CellId, EntityId, RegionId};
use worldview_region::{
    Area, CameraSetting, CameraSettingCatalog, CameraSettingCollection, Cell, PartitionFilter,
    Region, RegionKind, RegionView, WorldEntity,
};
use worldview_stream::{AoiConfig, AreaOfInterest, CellEvictionPolicy, GameMessage};

const CELL_SIZE: f32 = 1000.0;
const GRID_SIDE: u32 = 12;
const CELLS_PER_AREA: u32 = 4;

#[derive(Parser)]
#[command(name = "worldview-cli", about = "CLI tool for worldview area-of-interest sessions")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate info and default tuning
    Info,
    /// Walk a player across a sample region and print every batch
    Walk {
        /// Number of movement steps
        #[arg(short, long, default_value = "20")]
        steps: usize,
        /// Distance covered per step
        #[arg(long, default_value = "250")]
        stride: f32,
        /// YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Evict cells unseen for this many passes
        #[arg(long)]
        evict: Option<u64>,
        /// Use hub semantics (reveal-all minimap)
        #[arg(long)]
        hub: bool,
    },
    /// Print the effective config as YAML
    Config {
        /// YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("worldview-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("stream: {}", worldview_stream::crate_info());
            let config = AoiConfig::default();
            println!(
                "defaults: view_width={} view_offset={} view_expansion={} update_distance={}",
                config.view_width, config.view_offset, config.view_expansion, config.update_distance
            );
        }
        Commands::Walk {
            steps,
            stride,
            config,
            evict,
            hub,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(grace_passes) = evict {
                config.cell_eviction = CellEvictionPolicy::EvictStale { grace_passes };
            }
            walk(config, steps, stride, hub)?;
        }
        Commands::Config { config } => {
            let config = load_config(config.as_deref())?;
            print!("{}", config.to_yaml()?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AoiConfig> {
    match path {
        Some(path) => AoiConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(AoiConfig::default()),
    }
}

/// Sample region: a square grid of cells, grouped into row strips of areas,
/// with a mix of active, static and dormant entities.
fn build_region(kind: RegionKind) -> anyhow::Result<Region> {
    let mut catalog = CameraSettingCatalog::new().with_player_default(CameraSettingId(1));
    catalog.insert(CameraSettingCollection {
        id: CameraSettingId(1),
        settings: vec![CameraSetting {
            direction: Vec3::new(-1.0, -1.0, -1.4),
            distance: 1800.0,
            fov: 45.0,
        }],
    });
    let mut region = Region::new(RegionId(1), kind).with_camera_settings(catalog);

    let areas_per_row = GRID_SIDE / CELLS_PER_AREA;
    for row in 0..GRID_SIDE {
        for col in 0..GRID_SIDE {
            let area_id = AreaId(row * areas_per_row + col / CELLS_PER_AREA + 1);
            if !region.areas().contains_key(&area_id) {
                let origin = Vec3::new(
                    (col / CELLS_PER_AREA * CELLS_PER_AREA) as f32 * CELL_SIZE,
                    row as f32 * CELL_SIZE,
                    0.0,
                );
                region.add_area(Area::new(area_id, origin))?;
            }
            let min = Vec2::new(col as f32, row as f32) * CELL_SIZE;
            region.add_cell(Cell::new(
                CellId(row * GRID_SIDE + col + 1),
                area_id,
                format!("tile_{row}_{col}"),
                Aabb2::new(min, min + Vec2::splat(CELL_SIZE)),
            ))?;
        }
    }

    let mut next = 1;
    for row in 0..GRID_SIDE {
        for col in 0..GRID_SIDE {
            let center = Vec3::new(col as f32 + 0.5, row as f32 + 0.5, 0.0) * CELL_SIZE;
            let entity = match (row + col) % 5 {
                0 => WorldEntity::new(EntityId(next), "waypoint", center)
                    .with_partition(PartitionFilter::STATIC)
                    .tracked_after_discovery(),
                1 => WorldEntity::new(EntityId(next), "sleeper", center)
                    .with_partition(PartitionFilter::DORMANT),
                _ => WorldEntity::new(EntityId(next), "npc", center),
            };
            region.spawn_entity(entity)?;
            next += 1;
        }
    }
    region.drain_events();
    Ok(region)
}

fn walk(config: AoiConfig, steps: usize, stride: f32, hub: bool) -> anyhow::Result<()> {
    let kind = if hub { RegionKind::Hub } else { RegionKind::Standard };
    let region = build_region(kind)?;
    println!(
        "Region {}: {} areas, {} cells, {} entities",
        RegionId(1),
        region.areas().len(),
        region.cells().len(),
        region.entities().len()
    );

    let mut aoi = AreaOfInterest::new(config);
    aoi.reset(&region);
    aoi.init_player_view(Some(CameraSettingId(1)), region.camera_settings());

    let lane_y = GRID_SIDE as f32 * CELL_SIZE * 0.5;
    let mut position = Vec3::new(CELL_SIZE * 0.5, lane_y, 0.0);
    for step in 0..=steps {
        if step == 0 || aoi.should_update(position) {
            let cells = aoi.update_cells(&region, position)?;
            report(step, "cells", &cells);
            // The demo client acknowledges every new cell straight away.
            for message in &cells {
                if let GameMessage::CellCreate(desc) = message {
                    aoi.on_cell_loaded(desc.cell_id);
                }
            }
            let entities = aoi.update_entities(&region, position)?;
            report(step, "entities", &entities);
        }
        position.x += stride;
    }

    println!("{}", aoi.summary());
    Ok(())
}

fn report(step: usize, pass: &str, messages: &[GameMessage]) {
    if messages.is_empty() {
        return;
    }
    let kinds: Vec<String> = messages.iter().map(|m| format!("{:?}", m.kind())).collect();
    println!("step {step:>3} {pass:<8} {}", kinds.join(" "));
}
