//! # llama-sampling
//!
//! Stochastic decoding for the llama command server.
//!
//! Supports:
//! - Temperature scaling (always sampled, never greedy decoding)
//! - Top-k filtering
//! - Top-p (nucleus) filtering
//! - Seeded RNG for reproducible runs, entropy seeding otherwise

/// Sampling error type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SamplingError {
    #[error("Invalid logits array")]
    InvalidLogits,
    #[error("Temperature must be > 0")]
    InvalidTemperature,
    #[error("No valid tokens after filtering")]
    NoValidTokens,
}

pub type SamplingResult<T> = std::result::Result<T, SamplingError>;

/// Deterministic RNG for reproducible sampling.
///
/// Uses a simple xorshift64 algorithm for fast, reproducible random numbers.
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        // Zero state would produce all zeros.
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    /// Generate next random float in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        (self.state >> 40) as f32 / (1u64 << 24) as f32
    }
}

/// Sampling configuration and strategy.
#[derive(Debug, Clone)]
pub struct Sampler {
    /// Temperature for softmax scaling. > 1.0 = more random, < 1.0 = more deterministic.
    pub temperature: f32,

    /// Top-k: only sample from top k logits.
    pub top_k: Option<usize>,

    /// Top-p (nucleus sampling): sample from smallest set of tokens with cumulative prob >= p.
    pub top_p: Option<f32>,

    rng: SeededRng,
}

impl Sampler {
    /// Sampler at temperature 1.0 with a fixed seed.
    pub fn new() -> Self {
        Self {
            temperature: 1.0,
            top_k: None,
            top_p: None,
            rng: SeededRng::new(42),
        }
    }

    /// Sampler seeded from the OS RNG, so identical prompts diverge across runs.
    pub fn from_entropy() -> Self {
        Self::new().with_seed(rand::random())
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = temp;
        self
    }

    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }

    pub fn with_top_p(mut self, p: f32) -> Self {
        self.top_p = Some(p);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SeededRng::new(seed);
        self
    }

    /// Sample a token index from logits using the configured strategy.
    pub fn sample(&mut self, logits: &[f32]) -> SamplingResult<usize> {
        if logits.is_empty() {
            return Err(SamplingError::InvalidLogits);
        }
        if self.temperature <= 0.0 || !self.temperature.is_finite() {
            return Err(SamplingError::InvalidTemperature);
        }
        if !logits.iter().any(|l| l.is_finite()) {
            return Err(SamplingError::NoValidTokens);
        }

        let mut work_logits = logits.to_vec();

        if (self.temperature - 1.0).abs() > 1e-6 {
            for logit in &mut work_logits {
                *logit /= self.temperature;
            }
        }

        if let Some(k) = self.top_k {
            Self::apply_top_k(&mut work_logits, k);
        }

        let probs = Self::softmax(&work_logits);

        let probs = match self.top_p {
            Some(p) => Self::apply_top_p(&probs, p),
            None => probs,
        };

        self.sample_from_distribution(&probs)
    }

    fn apply_top_k(logits: &mut [f32], k: usize) {
        if k == 0 || k >= logits.len() {
            return;
        }

        let mut sorted: Vec<f32> = logits.to_vec();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

        let threshold = sorted[k - 1];
        for logit in logits.iter_mut() {
            if *logit < threshold {
                *logit = f32::NEG_INFINITY;
            }
        }
    }

    fn apply_top_p(probs: &[f32], p: f32) -> Vec<f32> {
        let mut sorted: Vec<f32> = probs.to_vec();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

        let mut cumsum = 0.0;
        let mut cutoff_prob = sorted[0];
        for &prob in &sorted {
            cumsum += prob;
            cutoff_prob = prob;
            if cumsum >= p {
                break;
            }
        }

        let mut result: Vec<f32> = probs
            .iter()
            .map(|&pr| if pr >= cutoff_prob { pr } else { 0.0 })
            .collect();

        let sum: f32 = result.iter().sum();
        if sum > 0.0 {
            for p in &mut result {
                *p /= sum;
            }
        }

        result
    }

    fn softmax(logits: &[f32]) -> Vec<f32> {
        let max_logit = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let exps: Vec<f32> = logits.iter().map(|&l| (l - max_logit).exp()).collect();
        let sum: f32 = exps.iter().sum();

        if sum > 0.0 {
            exps.iter().map(|&e| e / sum).collect()
        } else {
            vec![1.0 / logits.len() as f32; logits.len()]
        }
    }

    fn sample_from_distribution(&mut self, probs: &[f32]) -> SamplingResult<usize> {
        let r = self.rng.next_f32();
        let mut cumsum = 0.0;

        for (i, &prob) in probs.iter().enumerate() {
            cumsum += prob;
            if r < cumsum {
                return Ok(i);
            }
        }

        // Rounding left r above the final cumsum.
        probs
            .iter()
            .rposition(|&prob| prob > 0.0)
            .ok_or(SamplingError::NoValidTokens)
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_rng_reproducible() {
        let mut rng1 = SeededRng::new(42);
        let mut rng2 = SeededRng::new(42);

        for _ in 0..100 {
            let v1 = rng1.next_f32();
            let v2 = rng2.next_f32();
            assert!((v1 - v2).abs() < 1e-6);
            assert!((0.0..1.0).contains(&v1));
        }
    }

    #[test]
    fn low_temperature_concentrates_on_argmax() {
        let logits = vec![1.0, 10.0, 2.0, 0.5];
        let mut sampler = Sampler::new().with_temperature(0.01);
        for _ in 0..20 {
            assert_eq!(sampler.sample(&logits).unwrap(), 1);
        }
    }

    #[test]
    fn softmax_uniform() {
        let probs = Sampler::softmax(&[1.0, 1.0, 1.0]);
        assert!((probs[0] - 1.0 / 3.0).abs() < 1e-5);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn top_k_filtering() {
        let mut logits = vec![1.0, 10.0, 2.0, 0.5, 3.0];
        Sampler::apply_top_k(&mut logits, 2);
        assert!(logits[1].is_finite());
        assert!(logits[4].is_finite());
        assert!(!logits[0].is_finite());
    }

    #[test]
    fn top_p_filtering() {
        let filtered = Sampler::apply_top_p(&[0.5, 0.3, 0.15, 0.05], 0.8);
        assert!(filtered[0] > 0.0);
        assert!(filtered[1] > 0.0);
        assert_eq!(filtered[2], 0.0);
        assert_eq!(filtered[3], 0.0);
    }

    #[test]
    fn masked_logits_are_never_sampled() {
        let logits = vec![f32::NEG_INFINITY, 0.3, f32::NEG_INFINITY, 0.1];
        let mut sampler = Sampler::new().with_seed(3);
        for _ in 0..50 {
            let token = sampler.sample(&logits).unwrap();
            assert!(token == 1 || token == 3);
        }
    }

    #[test]
    fn all_masked_logits_error() {
        let logits = vec![f32::NEG_INFINITY; 4];
        let mut sampler = Sampler::new();
        assert_eq!(sampler.sample(&logits), Err(SamplingError::NoValidTokens));
    }

    #[test]
    fn invalid_temperature() {
        let mut sampler = Sampler::new().with_temperature(0.0);
        assert_eq!(
            sampler.sample(&[1.0, 2.0]),
            Err(SamplingError::InvalidTemperature)
        );
        let mut sampler = Sampler::new().with_temperature(f32::NAN);
        assert_eq!(
            sampler.sample(&[1.0, 2.0]),
            Err(SamplingError::InvalidTemperature)
        );
    }

    #[test]
    fn empty_logits() {
        let mut sampler = Sampler::new();
        assert_eq!(sampler.sample(&[]), Err(SamplingError::InvalidLogits));
    }
}
