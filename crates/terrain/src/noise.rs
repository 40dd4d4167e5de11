use minegame_common::WorldSeed;

/// Deterministic, stateless 2D noise parameterised by the world seed.
///
/// Given the same seed and coordinates every evaluation returns the same value,
/// which is what lets an evicted chunk be regenerated identically later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoiseField {
    seed: WorldSeed,
}

impl NoiseField {
    pub fn new(seed: WorldSeed) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Sine-based lattice hash in `[0, 1)`. Accepts fractional input.
    pub fn hash(&self, x: f64, z: f64) -> f64 {
        let seed = self.seed.value() as f64;
        let dot = (x + seed * 0.0017) * 127.1 + (z - seed * 0.0023) * 311.7;
        fract(dot.sin() * 43_758.545_312_3)
    }

    /// Bilinear interpolation of [`hash`](Self::hash) at the four surrounding lattice
    /// points, eased with smoothstep on both axes.
    pub fn value_noise(&self, x: f64, z: f64) -> f64 {
        let x0 = x.floor();
        let z0 = z.floor();
        let tx = smoothstep(x - x0);
        let tz = smoothstep(z - z0);

        let v00 = self.hash(x0, z0);
        let v10 = self.hash(x0 + 1.0, z0);
        let v01 = self.hash(x0, z0 + 1.0);
        let v11 = self.hash(x0 + 1.0, z0 + 1.0);

        let a = lerp(v00, v10, tx);
        let b = lerp(v01, v11, tx);
        lerp(a, b, tz)
    }

    /// Fractal Brownian motion: octaves of value noise at doubling frequency and halving
    /// amplitude, normalised by the amplitude sum so the result stays in `[0, 1)`.
    pub fn fbm(&self, x: f64, z: f64, octaves: u32) -> f64 {
        let mut value = 0.0;
        let mut amplitude = 0.5;
        let mut frequency = 1.0;
        let mut sum = 0.0;

        for _ in 0..octaves {
            value += self.value_noise(x * frequency, z * frequency) * amplitude;
            sum += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }

        if sum == 0.0 { 0.0 } else { value / sum }
    }
}

fn fract(n: f64) -> f64 {
    n - n.floor()
}

fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
