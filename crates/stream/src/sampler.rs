/// Largest `f32` strictly below 1.0.
const BELOW_ONE: f32 = 0.999_999_94;

/// Deterministic field sampler: `(cx, cz, salt)` to a value in `[0, 1)`.
///
/// The classic `fract(sin(dot) * 43758.5453)` hash, evaluated in `f64`.
/// There is no generator state: every draw is addressed by its salt, so the
/// result never depends on how many draws came before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldSampler {
    seed: u32,
}

impl FieldSampler {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn sample(&self, cx: i32, cz: i32, salt: u32) -> f32 {
        let dot = cx as f64 * 12.9898
            + cz as f64 * 78.233
            + salt as f64 * 37.719
            + (self.seed as f64 + 1.0) * 1.618034;
        let v = dot.sin() * 43758.5453;
        ((v - v.floor()) as f32).min(BELOW_ONE)
    }

    /// Sample mapped onto `[lo, hi)`.
    pub fn range(&self, cx: i32, cz: i32, salt: u32, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.sample(cx, cz, salt)
    }

    /// Sample mapped onto an index in `[0, len)`. `len` must be non-zero.
    pub fn index(&self, cx: i32, cz: i32, salt: u32, len: usize) -> usize {
        ((self.sample(cx, cz, salt) * len as f32) as usize).min(len - 1)
    }
}
