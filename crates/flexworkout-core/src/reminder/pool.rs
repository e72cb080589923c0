//! Circular queue of break suggestions.

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Mcg128Xsl64;

use crate::plan::Stretch;

/// Shuffled once, then cycled front to back so every stretch comes up
/// again within `ceil(len / n)` draws of `n`.
#[derive(Debug, Clone, Default)]
pub struct StretchPool {
    queue: VecDeque<Stretch>,
}

impl StretchPool {
    /// Keep the given order.
    pub fn in_order(items: Vec<Stretch>) -> Self {
        Self {
            queue: items.into(),
        }
    }

    /// Fisher-Yates shuffle with the given generator.
    pub fn shuffled<R: Rng + ?Sized>(mut items: Vec<Stretch>, rng: &mut R) -> Self {
        items.shuffle(rng);
        Self::in_order(items)
    }

    /// Shuffle with a fixed seed, or with entropy when `seed` is `None`.
    pub fn seeded(items: Vec<Stretch>, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        Self::shuffled(items, &mut rng)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Current queue order, front first.
    pub fn items(&self) -> Vec<Stretch> {
        self.queue.iter().cloned().collect()
    }

    /// Take `n` items from the front, rotating each to the back.
    pub fn draw(&mut self, n: usize) -> Vec<Stretch> {
        let mut drawn = Vec::with_capacity(n);
        if self.queue.is_empty() {
            return drawn;
        }
        for _ in 0..n {
            if let Some(item) = self.queue.pop_front() {
                drawn.push(item.clone());
                self.queue.push_back(item);
            }
        }
        drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::flattened_stretches;
    use std::collections::HashSet;

    #[test]
    fn draw_rotates_front_to_back() {
        let items = flattened_stretches();
        let mut pool = StretchPool::in_order(items.clone());
        let drawn = pool.draw(3);
        assert_eq!(drawn, items[..3].to_vec());
        assert_eq!(pool.items()[9..], items[..3]);
        assert_eq!(pool.len(), items.len());
    }

    #[test]
    fn same_seed_same_order() {
        let a = StretchPool::seeded(flattened_stretches(), Some(7));
        let b = StretchPool::seeded(flattened_stretches(), Some(7));
        assert_eq!(a.items(), b.items());
        let unique: HashSet<_> = a.items().into_iter().collect();
        assert_eq!(unique.len(), 12);
    }

    #[test]
    fn small_pool_wraps_within_one_draw() {
        let items = flattened_stretches()[..2].to_vec();
        let mut pool = StretchPool::in_order(items.clone());
        let drawn = pool.draw(3);
        assert_eq!(drawn, vec![items[0].clone(), items[1].clone(), items[0].clone()]);
        assert!(StretchPool::default().draw(3).is_empty());
    }
}
