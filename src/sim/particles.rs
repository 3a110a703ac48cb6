//! Crash explosion particles

use std::f64::consts::TAU;

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::{PARTICLE_DRAG, PARTICLE_GRAVITY};

/// Launch speed range (px/frame)
const SPEED_RANGE: (f64, f64) = (2.0, 6.0);
/// Radius range (px)
const SIZE_RANGE: (f64, f64) = (2.0, 6.0);
/// Life lost per frame
const DECAY_RANGE: (f64, f64) = (0.015, 0.025);

/// A single explosion particle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: DVec2,
    pub vel: DVec2,
    /// 1 at spawn, removed once it reaches 0
    pub life: f64,
    pub size: f64,
    pub decay: f64,
}

impl Particle {
    /// Advance one frame: move, fall, fade, slow down
    pub fn step(&mut self) {
        self.pos += self.vel;
        self.vel.y += PARTICLE_GRAVITY;
        self.life -= self.decay;
        self.vel *= PARTICLE_DRAG;
    }

    pub fn is_alive(&self) -> bool {
        self.life > 0.0
    }
}

/// The live particle set plus the RNG that seeds new explosions
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    rng: Pcg32,
}

impl ParticleSystem {
    pub fn new(seed: u64) -> Self {
        Self {
            particles: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Replace the live set with `count` particles bursting out of `origin`.
    ///
    /// Directions are evenly spaced around the circle; speed, size and decay
    /// are randomized per particle.
    pub fn explode(&mut self, origin: DVec2, count: usize) {
        self.particles.clear();
        self.particles.reserve(count);

        for i in 0..count {
            let angle = TAU * i as f64 / count as f64;
            let speed = self.rng.random_range(SPEED_RANGE.0..SPEED_RANGE.1);
            self.particles.push(Particle {
                pos: origin,
                vel: DVec2::new(angle.cos(), angle.sin()) * speed,
                life: 1.0,
                size: self.rng.random_range(SIZE_RANGE.0..SIZE_RANGE.1),
                decay: self.rng.random_range(DECAY_RANGE.0..DECAY_RANGE.1),
            });
        }
    }

    /// Integrate every particle one frame and drop the dead ones
    pub fn step(&mut self) {
        for particle in &mut self.particles {
            particle.step();
        }
        self.particles.retain(Particle::is_alive);
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}
