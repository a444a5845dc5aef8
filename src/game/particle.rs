// Explosion particles owned by a matched target.
use rand::Rng;

use crate::surface::Surface;

/// Short-lived point of an explosion burst. Radius and velocity are fixed at
/// creation; only position and lifetime evolve.
#[derive(Clone, Debug)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    radius: f64,
    vx: f64,
    vy: f64,
    life: u32,
    max_life: u32,
}

impl Particle {
    pub fn new<R: Rng>(x: f64, y: f64, lifetime: u32, rng: &mut R) -> Self {
        Self {
            x,
            y,
            radius: rng.gen_range(2.0..7.0),
            vx: rng.gen_range(-2.0..2.0),
            vy: rng.gen_range(-2.0..2.0),
            life: lifetime,
            max_life: lifetime,
        }
    }

    pub fn update(&mut self) {
        self.x += self.vx;
        self.y += self.vy;
        self.life = self.life.saturating_sub(1);
    }

    pub fn life(&self) -> u32 {
        self.life
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn velocity(&self) -> (f64, f64) {
        (self.vx, self.vy)
    }

    pub fn is_alive(&self) -> bool {
        self.life > 0
    }

    /// Linear fade: 1.0 when fresh, 0.0 once the lifetime is spent.
    pub fn alpha(&self) -> f64 {
        if self.max_life == 0 {
            return 0.0;
        }
        self.life as f64 / self.max_life as f64
    }

    pub fn render(&self, surface: &mut dyn Surface) {
        let color = format!("rgba(255, 165, 0, {})", self.alpha());
        surface.fill_circle(self.x, self.y, self.radius, &color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::recording::{Op, RecordingSurface};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn update_moves_and_decays() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut p = Particle::new(10.0, 20.0, 30, &mut rng);
        let (vx, vy) = p.velocity();
        let r = p.radius();
        p.update();
        assert!((p.x - (10.0 + vx)).abs() < 1e-9);
        assert!((p.y - (20.0 + vy)).abs() < 1e-9);
        assert_eq!(p.life(), 29);
        assert_eq!(p.velocity(), (vx, vy));
        assert_eq!(p.radius(), r);
    }

    #[test]
    fn random_ranges_hold() {
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..200 {
            let p = Particle::new(0.0, 0.0, 30, &mut rng);
            assert!((2.0..7.0).contains(&p.radius()));
            let (vx, vy) = p.velocity();
            assert!((-2.0..2.0).contains(&vx) && (-2.0..2.0).contains(&vy));
        }
    }

    #[test]
    fn alpha_fades_to_zero_and_particle_dies() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut p = Particle::new(0.0, 0.0, 30, &mut rng);
        assert_eq!(p.alpha(), 1.0);
        for _ in 0..15 {
            p.update();
        }
        assert!((p.alpha() - 0.5).abs() < 1e-9);
        for _ in 0..15 {
            p.update();
        }
        assert_eq!(p.alpha(), 0.0);
        assert!(!p.is_alive());
        p.update();
        assert_eq!(p.life(), 0);
    }

    #[test]
    fn render_uses_alpha() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut p = Particle::new(1.0, 2.0, 4, &mut rng);
        p.update();
        let mut s = RecordingSurface::new(100.0, 100.0);
        p.render(&mut s);
        match &s.ops[0] {
            Op::Circle { color, r, .. } => {
                assert_eq!(color, "rgba(255, 165, 0, 0.75)");
                assert_eq!(*r, p.radius());
            }
            other => panic!("unexpected op {:?}", other),
        }
    }
}
