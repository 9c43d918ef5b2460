//! Left/right swap.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverseStereoEffect {
    pub enabled: bool,
}

impl ReverseStereoEffect {
    pub fn new() -> Self {
        Self { enabled: true }
    }

    pub fn process(&self, samples: &mut [f32], channels: usize) {
        if !self.enabled || channels != 2 {
            return;
        }
        for frame in samples.chunks_exact_mut(2) {
            frame.swap(0, 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swaps_each_frame() {
        let mut samples = vec![0.1_f32, 0.2, 0.3, 0.4];
        ReverseStereoEffect::new().process(&mut samples, 2);
        assert_eq!(samples, vec![0.2, 0.1, 0.4, 0.3]);
    }
}
