/// Fireworks: a fixed particle set driven by one shared, wrapping clock
use log::debug;
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::settings::FireworksSettings;

/// Velocity and colour are sampled once and never change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub velocity: Vector3<f32>,
    pub color: Vector3<f32>,
}

/// Shared animation clock in seconds.
///
/// Elapsed time wraps to 0 once it passes `t_max`, so every particle restarts
/// together and the burst repeats with a fixed period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleClock {
    pub t_start: f32,
    pub t_max: f32,
}

impl ParticleClock {
    pub fn new(t_start: f32, t_max: f32) -> Self {
        Self { t_start, t_max }
    }

    /// Elapsed time at `now`, never above `t_max`
    pub fn elapsed(&mut self, now: f32) -> f32 {
        let t = now - self.t_start;
        if t > self.t_max {
            debug!("Fireworks clock wrapped at t = {t:.3}s");
            self.t_start = now;
            return 0.0;
        }
        t.max(0.0)
    }

    pub fn restart(&mut self, now: f32) {
        self.t_start = now;
    }
}

#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    start_position: Vector3<f32>,
    clock: ParticleClock,
}

impl ParticleSystem {
    pub fn new(settings: &FireworksSettings, now: f32) -> Self {
        Self {
            particles: Self::generate(settings.count, settings.seed),
            start_position: settings.start_position(),
            clock: ParticleClock::new(now, settings.t_max),
        }
    }

    /// Sample `count` particles: horizontal velocity in [-1, 1], vertical in
    /// [0, 2.4], colour channels in [0, 1].
    pub fn generate(count: usize, seed: u64) -> Vec<Particle> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| Particle {
                velocity: Vector3::new(
                    rng.gen_range(-1.0..=1.0),
                    rng.gen_range(0.0..=2.4),
                    rng.gen_range(-1.0..=1.0),
                ),
                color: Vector3::new(rng.gen(), rng.gen(), rng.gen()),
            })
            .collect()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn start_position(&self) -> Vector3<f32> {
        self.start_position
    }

    pub fn clock(&self) -> &ParticleClock {
        &self.clock
    }

    /// Shared elapsed time for this frame
    pub fn current_time(&mut self, now: f32) -> f32 {
        self.clock.elapsed(now)
    }

    /// Re-enabling the effect starts a fresh burst
    pub fn restart(&mut self, now: f32) {
        self.clock.restart(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ranges() {
        let particles = ParticleSystem::generate(500, 7);
        assert_eq!(particles.len(), 500);
        for p in &particles {
            assert!((-1.0..=1.0).contains(&p.velocity.x));
            assert!((0.0..=2.4).contains(&p.velocity.y));
            assert!((-1.0..=1.0).contains(&p.velocity.z));
            for c in p.color.iter() {
                assert!((0.0..=1.0).contains(c));
            }
        }
    }

    #[test]
    fn test_generation_is_seeded() {
        assert_eq!(ParticleSystem::generate(16, 42), ParticleSystem::generate(16, 42));
        assert_ne!(ParticleSystem::generate(16, 42), ParticleSystem::generate(16, 43));
    }

    #[test]
    fn test_clock_wraps() {
        let mut clock = ParticleClock::new(0.0, 4.0);
        assert_eq!(clock.elapsed(3.0), 3.0);
        assert_eq!(clock.elapsed(4.5), 0.0);
        assert_eq!(clock.t_start, 4.5);
        assert_eq!(clock.elapsed(5.0), 0.5);
    }

    #[test]
    fn test_elapsed_never_exceeds_max() {
        let mut clock = ParticleClock::new(0.0, 4.0);
        for step in 0..1000 {
            let t = clock.elapsed(step as f32 * 0.37);
            assert!((0.0..=4.0).contains(&t));
        }
    }

    #[test]
    fn test_restart_on_enable() {
        let settings = FireworksSettings::default();
        let mut system = ParticleSystem::new(&settings, 0.0);
        system.restart(10.0);
        assert_eq!(system.current_time(10.0), 0.0);
        assert_eq!(system.current_time(11.0), 1.0);
        assert_eq!(system.particles().len(), settings.count);
    }
}
