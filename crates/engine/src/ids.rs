use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Length of the alphanumeric branch identifiers.
pub const BRANCH_ID_LEN: usize = 16;

/// Source of opaque identifiers for one run.
///
/// Identifiers are random, not derived from content, and are not checked
/// against previously issued values.
pub struct IdGenerator {
    rng: StdRng,
}

impl IdGenerator {
    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    /// Reproducible stream, for tests and `--seed` runs.
    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// Decimal rendering of a uniformly random `u64`.
    pub fn new_id(&mut self) -> String {
        self.rng.gen::<u64>().to_string()
    }

    pub fn new_branch_id(&mut self) -> String {
        (&mut self.rng)
            .sample_iter(&Alphanumeric)
            .take(BRANCH_ID_LEN)
            .map(char::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_decimal_u64() {
        let mut ids = IdGenerator::seeded(7);
        for _ in 0..100 {
            let id = ids.new_id();
            assert!(id.parse::<u64>().is_ok(), "{id}");
        }
    }

    #[test]
    fn seeded_streams_repeat() {
        let mut a = IdGenerator::seeded(42);
        let mut b = IdGenerator::seeded(42);
        assert_eq!(a.new_id(), b.new_id());
        assert_eq!(a.new_branch_id(), b.new_branch_id());
    }

    #[test]
    fn consecutive_ids_differ() {
        let mut ids = IdGenerator::seeded(1);
        assert_ne!(ids.new_id(), ids.new_id());
    }

    #[test]
    fn branch_ids_are_alphanumeric() {
        let mut ids = IdGenerator::from_entropy();
        let id = ids.new_branch_id();
        assert_eq!(id.len(), BRANCH_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
