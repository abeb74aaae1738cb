//! `strider-sim`: drives a path follower across an open field and reports
//! how well the walkability caches did.

use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use glam::Vec3;
use log::{info, warn};
use strider::numeric::{count_to_f32, step_count};
use strider::{
    init_logging, Aabb, NavigationConfig, Obstacle, PathFollower, PathHandle, PhysicsError,
    PhysicsQuery, WalkabilityCacheManager,
};

/// Path following and walkability caching demo
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Ticks to simulate
    #[arg(short, long, default_value_t = 400)]
    ticks: u32,
    /// Seconds per tick
    #[arg(long, default_value_t = 0.1)]
    dt: f32,
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

const AGENT: u32 = 0;

/// Flat ground with a few pillars beside the demo route.
struct OpenField {
    obstacles: Vec<Obstacle>,
}

impl OpenField {
    fn new() -> Self {
        let ground = Aabb::new(Vec3::new(-50.0, -50.0, -1.0), Vec3::new(50.0, 50.0, 0.0));
        let pillars = [Vec3::new(5.0, 2.0, 0.0), Vec3::new(12.0, 5.0, 0.0), Vec3::new(15.0, 12.0, 0.0)];
        let obstacles = std::iter::once(ground)
            .chain(
                pillars
                    .iter()
                    .map(|base| Aabb::new(*base - Vec3::new(0.4, 0.4, 0.0), *base + Vec3::new(0.4, 0.4, 3.0))),
            )
            .zip(1_u64..)
            .map(|(bounds, id)| Obstacle::new(id, bounds))
            .collect();
        Self { obstacles }
    }
}

impl PhysicsQuery for OpenField {
    fn overlap(&self, region: &Aabb) -> Result<Vec<Obstacle>, PhysicsError> {
        Ok(self
            .obstacles
            .iter()
            .filter(|obstacle| obstacle.bounds.intersects(region))
            .copied()
            .collect())
    }

    fn find_floor(
        &self,
        position: Vec3,
        search_radius: f32,
        search_height: f32,
        candidates: &[Obstacle],
    ) -> Option<f32> {
        let column = Aabb::new(
            position - Vec3::new(search_radius, search_radius, search_height),
            position + Vec3::new(search_radius, search_radius, 0.0),
        );
        candidates
            .iter()
            .map(|obstacle| obstacle.bounds)
            .filter(|bounds| {
                bounds.intersects(&column) && bounds.max.z <= position.z && bounds.max.z >= column.min.z
            })
            .map(|bounds| bounds.max.z)
            .reduce(f32::max)
    }

    fn capsule_overlaps(&self, start: Vec3, end: Vec3, radius: f32, candidates: &[Obstacle]) -> bool {
        let samples = step_count(start.distance(end), radius * 0.5).unwrap_or(1);
        candidates.iter().any(|obstacle| {
            (0..=samples).any(|i| {
                let point = start.lerp(end, count_to_f32(i) / count_to_f32(samples));
                obstacle.bounds.distance_squared_to(point) <= radius * radius
            })
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    ensure!(init_logging(args.verbose), "a logger was already installed");

    let config = args
        .config
        .as_deref()
        .map(NavigationConfig::from_path)
        .transpose()
        .context("failed to load configuration")?
        .unwrap_or_default();

    let field = OpenField::new();
    let route = PathHandle::from_points([
        Vec3::ZERO,
        Vec3::new(10.0, 0.0, 0.0),
        Vec3::new(10.0, 10.0, 0.0),
        Vec3::new(20.0, 10.0, 0.0),
    ]);
    let mut follower = PathFollower::new(config.follower.clone());
    follower.attach_to_path(Some(route));
    let mut walkability = WalkabilityCacheManager::<u32>::new(config.walkability);
    walkability.enable_actor(AGENT, true);

    let radius = follower.params().agent_radius;
    let mut position = Vec3::ZERO;
    let mut velocity = Vec3::ZERO;
    for tick in 0..args.ticks {
        walkability.pre_update();
        let Some(result) = follower.update(position, velocity, args.dt) else {
            break;
        };
        let ahead = walkability.check_walkability(AGENT, position, result.follow_target, radius, &field);
        if !ahead.walkable {
            warn!("tick {tick}: way to {:.2?} is blocked", result.follow_target);
        }

        velocity = result.velocity;
        position += velocity * args.dt;
        if let Some(floor) = walkability.find_floor(AGENT, position, &field) {
            position.z = floor;
        }
        walkability.post_update();

        if tick % 10 == 0 {
            info!(
                "tick {tick}: at {position:.2?}, speed {:.2}, {:.2} left",
                velocity.length(),
                follower.dist_to_end(Some(position))
            );
        }
        if result.reached_end {
            info!("reached the end after {} ticks", tick + 1);
            break;
        }
    }

    let stats = walkability.stats();
    info!(
        "walkability: {} requests, {:.0}% cached; floor: {} requests, {:.0}% cached",
        stats.walkability_requests,
        stats.walkability_hit_rate() * 100.0,
        stats.floor_requests,
        stats.floor_hit_rate() * 100.0
    );
    Ok(())
}
