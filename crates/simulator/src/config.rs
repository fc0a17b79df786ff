//! Configuration parsing and validation for fluid scenes.

use glam::{Vec2, Vec3};
use kernel::ParameterSet;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;

use crate::Simulator;

/// Main scene configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Human-readable scene name
    pub name: String,
    /// Worker threads for the physics stepper
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Spawn origin for particle blocks [x, y, z]
    #[serde(default = "default_spawn_origin")]
    pub spawn_origin: [f32; 3],
    /// Named fluid parameter sets
    pub fluids: Vec<FluidConfig>,
    /// Boundary plane patches
    #[serde(default)]
    pub planes: Vec<PlaneConfig>,
    /// Particle groups to spawn, in order
    pub groups: Vec<GroupConfig>,
}

/// One named fluid parameter set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FluidConfig {
    /// Name referenced by spawn groups
    pub name: String,
    /// Collision radius against boundary patches
    pub particle_radius: f32,
    /// Kernel support radius
    pub smoothing_radius: f32,
    /// Density at which the fluid is unpressurized
    pub rest_density: f32,
    /// Gravitational acceleration magnitude (scene units / s^2)
    #[serde(default = "default_gravity_mult")]
    pub gravity_mult: f32,
    /// Per-particle mass
    pub particle_mass: f32,
    /// Viscosity coefficient
    #[serde(default = "default_viscosity")]
    pub particle_viscosity: f32,
    /// Linear drag coefficient
    #[serde(default = "default_drag")]
    pub particle_drag: f32,
}

/// One rectangular boundary patch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaneConfig {
    /// Patch center point [x, y, z]
    pub point: [f32; 3],
    /// First in-plane direction [x, y, z], unit length
    pub dir_u: [f32; 3],
    /// Second in-plane direction [x, y, z], unit length, orthogonal to `dir_u`
    pub dir_v: [f32; 3],
    /// Half-extent along each direction [u, v]
    pub half_extents: [f32; 2],
}

/// One bulk spawn of particles bound to a named fluid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Name of the fluid parameter set to bind
    pub fluid: String,
    /// Number of particles to spawn
    pub count: usize,
}

// Default values
fn default_worker_count() -> usize {
    16
}

fn default_spawn_origin() -> [f32; 3] {
    [-6.0, 0.0, 0.0]
}

fn default_gravity_mult() -> f32 {
    2000.0
}

fn default_viscosity() -> f32 {
    1.0
}

fn default_drag() -> f32 {
    0.025
}

impl FluidConfig {
    /// Convert into the kernel's parameter set.
    pub fn to_parameter_set(&self) -> ParameterSet {
        ParameterSet::new(
            self.particle_radius,
            self.smoothing_radius,
            self.rest_density,
            self.gravity_mult,
            self.particle_mass,
            self.particle_viscosity,
            self.particle_drag,
        )
    }
}

impl SceneConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &str) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path, e))?;

        let config: SceneConfig = serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse config JSON: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Structural checks only; physical values are re-checked by the
    /// kernel's own validation when the scene is built.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be at least 1".to_string());
        }

        if self.fluids.is_empty() {
            return Err("At least one fluid must be configured".to_string());
        }

        let mut seen = HashSet::new();
        for fluid in &self.fluids {
            if !seen.insert(fluid.name.as_str()) {
                return Err(format!("Duplicate fluid name: {}", fluid.name));
            }
        }

        for group in &self.groups {
            if !seen.contains(group.fluid.as_str()) {
                return Err(format!(
                    "Spawn group references unknown fluid: {}",
                    group.fluid
                ));
            }
        }

        Ok(())
    }

    /// Build a ready-to-step simulator from this configuration.
    pub fn build(&self) -> Result<Simulator, String> {
        self.validate()?;
        tracing::info!("Building scene: {}", self.name);

        // 1. Facade with its fixed worker pool
        let mut simulator = Simulator::new(self.worker_count, Vec3::from(self.spawn_origin))
            .map_err(|e| e.to_string())?;

        // 2. Register every fluid and remember its handle by name
        let mut handles = HashMap::new();
        for fluid in &self.fluids {
            let handle = simulator
                .add_parameter_set(fluid.to_parameter_set())
                .map_err(|e| format!("Fluid {}: {}", fluid.name, e))?;
            handles.insert(fluid.name.as_str(), handle);
        }

        // 3. Boundary patches
        for plane in &self.planes {
            simulator
                .add_plane(
                    Vec3::from(plane.point),
                    Vec3::from(plane.dir_u),
                    Vec3::from(plane.dir_v),
                    Vec2::from(plane.half_extents),
                )
                .map_err(|e| e.to_string())?;
        }

        // 4. Spawn groups in declaration order
        for group in &self.groups {
            let handle = handles[group.fluid.as_str()];
            simulator
                .add_particles(group.count, handle)
                .map_err(|e| e.to_string())?;
        }

        tracing::info!(
            "Scene ready: {} particles, {} planes, {} fluids",
            simulator.particles().len(),
            simulator.planes().len(),
            self.fluids.len()
        );
        Ok(simulator)
    }

    /// The recovered splash-box demo scene: one water-like fluid dropped
    /// into an open-topped box of five patches.
    pub fn splash_box(particle_count: usize, worker_count: usize) -> Self {
        Self {
            name: "splash-box".to_string(),
            worker_count,
            spawn_origin: default_spawn_origin(),
            fluids: vec![FluidConfig {
                name: "water".to_string(),
                particle_radius: 0.7,
                smoothing_radius: 1.0,
                rest_density: 15.0,
                gravity_mult: default_gravity_mult(),
                particle_mass: 0.1,
                particle_viscosity: default_viscosity(),
                particle_drag: default_drag(),
            }],
            planes: splash_box_planes(20.0, 15.0),
            groups: vec![GroupConfig {
                fluid: "water".to_string(),
                count: particle_count,
            }],
        }
    }
}

/// Five patches forming an open-topped box: a ground square at y = 0 and
/// four walls, every normal facing the interior.
pub fn splash_box_planes(half_extent: f32, wall_half_height: f32) -> Vec<PlaneConfig> {
    let e = half_extent;
    let mid = wall_half_height;
    vec![
        // Ground, normal +y
        PlaneConfig {
            point: [0.0, 0.0, 0.0],
            dir_u: [1.0, 0.0, 0.0],
            dir_v: [0.0, 0.0, 1.0],
            half_extents: [e, e],
        },
        // x = -e wall, normal +x
        PlaneConfig {
            point: [-e, mid, 0.0],
            dir_u: [0.0, 0.0, 1.0],
            dir_v: [0.0, 1.0, 0.0],
            half_extents: [e, mid],
        },
        // x = +e wall, normal -x
        PlaneConfig {
            point: [e, mid, 0.0],
            dir_u: [0.0, 0.0, -1.0],
            dir_v: [0.0, 1.0, 0.0],
            half_extents: [e, mid],
        },
        // z = -e wall, normal +z
        PlaneConfig {
            point: [0.0, mid, -e],
            dir_u: [-1.0, 0.0, 0.0],
            dir_v: [0.0, 1.0, 0.0],
            half_extents: [e, mid],
        },
        // z = +e wall, normal -z
        PlaneConfig {
            point: [0.0, mid, e],
            dir_u: [1.0, 0.0, 0.0],
            dir_v: [0.0, 1.0, 0.0],
            half_extents: [e, mid],
        },
    ]
}
