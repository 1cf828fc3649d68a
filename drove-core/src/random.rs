use rand::rngs::{SmallRng, StdRng};
use rand::Rng;

/// Source of uniform draws used for every random decision a virtual user makes.
///
/// Keeping this narrow lets tests pin the draw to a known value and keeps the selection
/// algorithms independent of any particular RNG API.
pub trait RandomSource {
    /// Uniform draw in `[0, bound)`. Returns 0 when `bound` is 0.
    fn draw(&mut self, bound: u64) -> u64;
}

impl RandomSource for SmallRng {
    fn draw(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            0
        } else {
            self.gen_range(0..bound)
        }
    }
}

impl RandomSource for StdRng {
    fn draw(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            0
        } else {
            self.gen_range(0..bound)
        }
    }
}

/// A source pinned to one end of every range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedDraw {
    Lowest,
    Highest,
}

impl RandomSource for FixedDraw {
    fn draw(&mut self, bound: u64) -> u64 {
        match self {
            FixedDraw::Lowest => 0,
            FixedDraw::Highest => bound.saturating_sub(1),
        }
    }
}

/// Uniformly choose one element of `items`.
pub fn choose<'a, T, R>(rng: &mut R, items: &'a [T]) -> Option<&'a T>
where
    R: RandomSource + ?Sized,
{
    if items.is_empty() {
        return None;
    }
    // NOTE: usize -> u64 is lossless on every supported target
    let idx = rng.draw(items.len() as u64) as usize;
    items.get(idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn draws_stay_below_bound() {
        let mut rng = SmallRng::seed_from_u64(7);
        for bound in [1, 2, 3, 10, 1_000] {
            for _ in 0..1_000 {
                assert!(rng.draw(bound) < bound);
            }
        }
        assert_eq!(rng.draw(0), 0);
    }

    #[test]
    fn fixed_draw_edges() {
        assert_eq!(FixedDraw::Lowest.draw(4), 0);
        assert_eq!(FixedDraw::Highest.draw(4), 3);
        assert_eq!(FixedDraw::Highest.draw(0), 0);
    }

    #[test]
    fn choose_from_slice() {
        let items = ["a", "b", "c"];
        assert_eq!(choose(&mut FixedDraw::Lowest, &items), Some(&"a"));
        assert_eq!(choose(&mut FixedDraw::Highest, &items), Some(&"c"));
        assert_eq!(choose::<&str, _>(&mut FixedDraw::Lowest, &[]), None);
    }
}
