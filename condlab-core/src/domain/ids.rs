//! Node identifiers and their sources.
//!
//! Ids look like `cond-<base36 millis>-<6 base36 chars>` for tree nodes and
//! `ind-...` for indicator entries. Production code draws them from the clock
//! plus `thread_rng`; tests and reproducible tooling use a seeded source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Prefix for condition-tree node ids.
pub const NODE_PREFIX: &str = "cond";
/// Prefix for indicator entry ids.
pub const INDICATOR_PREFIX: &str = "ind";

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Anything that can mint fresh ids.
pub trait IdSource {
    fn next_id(&mut self, prefix: &str) -> String;
}

/// Clock + thread RNG ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_id(&mut self, prefix: &str) -> String {
        let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let mut rng = rand::thread_rng();
        format!("{prefix}-{}-{}", to_base36(millis), random_suffix(&mut rng))
    }
}

/// Deterministic ids: a seeded RNG plus a monotonically increasing counter
/// standing in for the clock.
#[derive(Debug, Clone)]
pub struct SeededIds {
    rng: StdRng,
    counter: u64,
}

impl SeededIds {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            counter: 0,
        }
    }
}

impl IdSource for SeededIds {
    fn next_id(&mut self, prefix: &str) -> String {
        self.counter += 1;
        let suffix = random_suffix(&mut self.rng);
        format!("{prefix}-{}-{suffix}", to_base36(self.counter))
    }
}

fn random_suffix<R: Rng>(rng: &mut R) -> String {
    (0..6)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// Lower-case base-36 rendering of an unsigned integer.
pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base36_known_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_295), "zz");
    }

    #[test]
    fn seeded_ids_are_reproducible() {
        let mut a = SeededIds::new(7);
        let mut b = SeededIds::new(7);
        for _ in 0..10 {
            assert_eq!(a.next_id(NODE_PREFIX), b.next_id(NODE_PREFIX));
        }
    }

    #[test]
    fn seeded_ids_are_unique() {
        let mut ids = SeededIds::new(1);
        let all: std::collections::HashSet<String> =
            (0..500).map(|_| ids.next_id(NODE_PREFIX)).collect();
        assert_eq!(all.len(), 500);
    }

    #[test]
    fn random_ids_have_expected_shape() {
        let id = RandomIds.next_id(INDICATOR_PREFIX);
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ind");
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
