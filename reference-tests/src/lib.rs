//! Reference test framework for fluid scene validation
//!
//! Runs complete scenes through the `simulator` facade for a fixed number
//! of ticks and validates the physical outcome: containment, settling,
//! and bounded kinetic energy.


pub mod scenario;

use kernel::ParticleStore;
use simulator::{Diagnostics, SceneConfig};

/// Expected result criteria for a reference test
#[derive(Debug, Clone)]
pub struct ExpectedResult {
    /// Particle position bounds validation
    pub position_bounds: Option<PositionBoundsCheck>,
    /// Settling check (no particle below the floor)
    pub settling: Option<SettlingCheck>,
    /// Kinetic energy boundedness check
    pub kinetic_energy: Option<KineticEnergyCheck>,
}

/// Check that particles remain within specified bounds
#[derive(Debug, Clone)]
pub struct PositionBoundsCheck {
    /// Minimum allowed position [x, y, z]
    pub min: [f32; 3],
    /// Maximum allowed position [x, y, z]
    pub max: [f32; 3],
}

/// Check that no particle ends below the floor
#[derive(Debug, Clone)]
pub struct SettlingCheck {
    /// Floor Y position
    pub floor_y: f32,
    /// Allowed penetration below the floor (one particle radius)
    pub tolerance: f32,
}

/// Check that kinetic energy stays bounded and decays after its peak
#[derive(Debug, Clone)]
pub struct KineticEnergyCheck {
    /// Maximum allowed kinetic energy near the end of the run
    pub max_final: f64,
    /// Late-run energy must be at most this fraction of the peak
    pub decay_from_peak: f64,
}

/// Result of running a reference test
#[derive(Debug)]
pub struct TestResult {
    /// Test name
    pub name: String,
    /// Whether test passed
    pub passed: bool,
    /// Individual check results
    pub checks: Vec<CheckResult>,
    /// Number of ticks executed
    pub ticks: usize,
    /// Simulated time (seconds)
    pub sim_time: f64,
    /// Scene diagnostics at the final tick
    pub final_diagnostics: Diagnostics,
}

/// Result of an individual validation check
#[derive(Debug)]
pub struct CheckResult {
    /// Check name
    pub name: String,
    /// Whether check passed
    pub passed: bool,
    /// Error message if failed
    pub message: Option<String>,
}

/// A reference test case
pub struct ReferenceTest {
    /// Test name
    pub name: String,
    /// Scene to build and run
    pub scene: SceneConfig,
    /// Number of ticks to run
    pub ticks: usize,
    /// Frame time passed to each update, in milliseconds
    pub dt_ms: f32,
    /// Expected results to validate
    pub expected: ExpectedResult,
}

/// Ticks between kinetic energy samples.
const SAMPLE_EVERY: usize = 10;

impl ReferenceTest {
    /// Run the reference test and return results
    pub fn run(&self) -> Result<TestResult, String> {
        tracing::info!("Running reference test: {}", self.name);

        let mut sim = self.scene.build()?;
        tracing::info!(
            "Initialized: {} particles, {} planes, {} workers",
            sim.particles().len(),
            sim.planes().len(),
            sim.worker_count()
        );

        // Run the scene, sampling kinetic energy as we go
        tracing::info!("Running {} ticks...", self.ticks);
        let mut ke_samples = Vec::new();
        let mut sim_time = 0.0_f64;
        for tick in 0..self.ticks {
            sim.update(self.dt_ms);
            sim_time += (self.dt_ms as f64 * 1.0e-3).min(simulator::MAX_STEP_SECONDS as f64);

            if tick % SAMPLE_EVERY == 0 || tick + 1 == self.ticks {
                ke_samples.push(sim.diagnostics().total_kinetic_energy);
            }

            // Log progress every 10% of ticks
            if (tick + 1) % (self.ticks / 10).max(1) == 0 {
                let progress = ((tick + 1) as f32 / self.ticks as f32) * 100.0;
                tracing::info!("Progress: {:.0}% ({}/{})", progress, tick + 1, self.ticks);
            }
        }
        tracing::info!(
            "Run complete: {} ticks, {:.3}s simulated",
            self.ticks,
            sim_time
        );

        let particles = sim.particles();
        let final_diagnostics = sim.diagnostics();

        // Validate results
        let mut checks = Vec::new();
        let mut all_passed = true;

        if let Some(ref bounds) = self.expected.position_bounds {
            let check = validate_position_bounds(particles, bounds);
            all_passed &= check.passed;
            checks.push(check);
        }

        if let Some(ref settling) = self.expected.settling {
            let check = validate_settling(particles, settling);
            all_passed &= check.passed;
            checks.push(check);
        }

        if let Some(ref energy) = self.expected.kinetic_energy {
            let check = validate_kinetic_energy(&ke_samples, energy);
            all_passed &= check.passed;
            checks.push(check);
        }

        Ok(TestResult {
            name: self.name.clone(),
            passed: all_passed,
            checks,
            ticks: self.ticks,
            sim_time,
            final_diagnostics,
        })
    }
}

/// Validate that particles remain within specified bounds
fn validate_position_bounds(
    particles: &ParticleStore,
    bounds: &PositionBoundsCheck,
) -> CheckResult {
    let mut violations = 0;
    let mut max_violation = 0.0_f32;

    for p in &particles.positions {
        let pos = p.to_array();
        for axis in 0..3 {
            if pos[axis] < bounds.min[axis] {
                violations += 1;
                max_violation = max_violation.max(bounds.min[axis] - pos[axis]);
            }
            if pos[axis] > bounds.max[axis] {
                violations += 1;
                max_violation = max_violation.max(pos[axis] - bounds.max[axis]);
            }
        }
    }

    if violations == 0 {
        CheckResult {
            name: "Position Bounds".to_string(),
            passed: true,
            message: None,
        }
    } else {
        CheckResult {
            name: "Position Bounds".to_string(),
            passed: false,
            message: Some(format!(
                "{} particles out of bounds (max violation: {:.4})",
                violations, max_violation
            )),
        }
    }
}

/// Validate that no particle finished below the floor
fn validate_settling(particles: &ParticleStore, check: &SettlingCheck) -> CheckResult {
    let lowest_allowed = check.floor_y - check.tolerance;

    let mut sunk_count = 0;
    let mut min_height = f32::INFINITY;
    for p in &particles.positions {
        if p.y < lowest_allowed {
            sunk_count += 1;
        }
        min_height = min_height.min(p.y);
    }

    if sunk_count == 0 {
        CheckResult {
            name: "Settling".to_string(),
            passed: true,
            message: Some(format!(
                "All {} particles above the floor (min height: {:.4}, limit: {:.4})",
                particles.len(),
                min_height,
                lowest_allowed
            )),
        }
    } else {
        CheckResult {
            name: "Settling".to_string(),
            passed: false,
            message: Some(format!(
                "{} / {} particles below the floor (min height: {:.4}, limit: {:.4})",
                sunk_count,
                particles.len(),
                min_height,
                lowest_allowed
            )),
        }
    }
}

/// Validate that kinetic energy stayed bounded and decayed after its peak
fn validate_kinetic_energy(samples: &[f64], check: &KineticEnergyCheck) -> CheckResult {
    if samples.is_empty() {
        return CheckResult {
            name: "Kinetic Energy".to_string(),
            passed: false,
            message: Some("No samples collected".to_string()),
        };
    }

    let peak = samples.iter().cloned().fold(0.0_f64, f64::max);
    let tail_start = samples.len() - (samples.len() / 10).max(1);
    let tail_peak = samples[tail_start..]
        .iter()
        .cloned()
        .fold(0.0_f64, f64::max);

    let bounded = tail_peak <= check.max_final;
    let decayed = tail_peak <= check.decay_from_peak * peak || peak == 0.0;

    if bounded && decayed {
        CheckResult {
            name: "Kinetic Energy".to_string(),
            passed: true,
            message: Some(format!(
                "Peak: {:.1}, late peak: {:.1} (limit: {:.1})",
                peak, tail_peak, check.max_final
            )),
        }
    } else {
        let mut issues = Vec::new();
        if !bounded {
            issues.push(format!(
                "late peak {:.1} above limit {:.1}",
                tail_peak, check.max_final
            ));
        }
        if !decayed {
            issues.push(format!(
                "late peak {:.1} has not decayed from run peak {:.1}",
                tail_peak, peak
            ));
        }
        CheckResult {
            name: "Kinetic Energy".to_string(),
            passed: false,
            message: Some(issues.join(", ")),
        }
    }
}

impl TestResult {
    /// Print a summary of the test result
    pub fn print_summary(&self) {
        println!("\n{}", "=".repeat(80));
        println!("Test: {}", self.name);
        println!("{}", "=".repeat(80));
        println!("Status: {}", if self.passed { "PASSED" } else { "FAILED" });
        println!("Ticks: {}", self.ticks);
        println!("Simulated time: {:.3} s", self.sim_time);
        println!("\nFinal Diagnostics:");
        println!("  Particles: {}", self.final_diagnostics.particle_count);
        println!(
            "  Kinetic energy: {:.3}",
            self.final_diagnostics.total_kinetic_energy
        );
        println!("  Max speed: {:.3}", self.final_diagnostics.max_speed);
        println!("  Mean density: {:.3}", self.final_diagnostics.mean_density);
        println!("\nValidation Checks:");
        for check in &self.checks {
            let status = if check.passed { "PASS" } else { "FAIL" };
            print!("  [{}] {}", status, check.name);
            if let Some(ref msg) = check.message {
                print!(" - {}", msg);
            }
            println!();
        }
        println!("{}", "=".repeat(80));
    }
}
