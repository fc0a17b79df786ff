//! Two-particle symmetry tests.
//!
//! Verifies Newton's 3rd law (forces equal and opposite) and momentum
//! conservation for the smallest interacting system.

use glam::Vec3;
use kernel::{BoundarySet, ParameterSet, ParamsRegistry, ParticleStore, Stepper};

/// Two particles of one set separated along the x-axis, compressed enough
/// that pressure is active. Gravity and drag are off for symmetry.
fn setup_pair(separation: f32) -> (ParamsRegistry, ParticleStore) {
    let mut registry = ParamsRegistry::new();
    let set = ParameterSet::new(0.1, 1.0, 0.5, 0.0, 0.5, 1.0, 0.0);
    let handle = registry.register(set).unwrap();

    let mut store = ParticleStore::new();
    store.push(Vec3::ZERO, handle);
    store.push(Vec3::new(separation, 0.0, 0.0), handle);
    (registry, store)
}

#[test]
fn forces_equal_and_opposite() {
    let (registry, mut store) = setup_pair(0.5);
    let bounds = BoundarySet::new();
    let mut stepper = Stepper::new(1).unwrap();

    stepper.step(&mut store, &registry, &bounds, 0.0001);

    let f0 = store.forces[0];
    let f1 = store.forces[1];

    assert!(
        f0.length() > 0.0,
        "compressed pair must feel pressure, got {f0}"
    );
    let sum = f0 + f1;
    assert!(
        sum.length() <= f0.length() * 1.0e-6,
        "forces not equal and opposite: f0={f0}, f1={f1}, sum={sum}"
    );

    // By symmetry the force is along the x-axis only, pushing apart.
    assert!(f0.x < 0.0, "particle 0 must be pushed toward -x, got {f0}");
    assert_eq!(f0.y, 0.0, "fy should be 0 for x-axis alignment, got {f0}");
    assert_eq!(f0.z, 0.0, "fz should be 0 for x-axis alignment, got {f0}");
}

#[test]
fn momentum_conserved() {
    let (registry, mut store) = setup_pair(0.5);
    let mass = registry.sets()[0].particle_mass;
    let bounds = BoundarySet::new();
    let mut stepper = Stepper::new(1).unwrap();

    let dt = 0.0001;
    for _ in 0..10 {
        stepper.step(&mut store, &registry, &bounds, dt);
    }

    let momentum: Vec3 = store
        .velocities
        .iter()
        .map(|&v| v * mass)
        .fold(Vec3::ZERO, |acc, p| acc + p);

    let tol = mass * 1.0e-4;
    assert!(
        momentum.length() < tol,
        "momentum not conserved with no external forces: {momentum}"
    );
}

#[test]
fn compressed_pair_separates() {
    let (registry, mut store) = setup_pair(0.5);
    let initial = store.positions[0].distance(store.positions[1]);
    let bounds = BoundarySet::new();
    let mut stepper = Stepper::new(1).unwrap();

    for _ in 0..10 {
        stepper.step(&mut store, &registry, &bounds, 0.0001);
    }

    let settled = store.positions[0].distance(store.positions[1]);
    assert!(
        settled > initial,
        "pressure must do work against compression: {initial} -> {settled}"
    );
}
