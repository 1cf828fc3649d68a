//! Weighted choice over a cumulative partition.
use crate::error::ArchetypeError;
use drove_core::RandomSource;

/// Items laid out over `[0, total)` in insertion order, each owning a slice as wide as
/// its weight. A draw in that interval selects the item whose slice contains it.
#[derive(Debug, Clone)]
pub struct WeightedTable<T> {
    items: Vec<T>,
    ends: Vec<u64>,
    total: u64,
}

impl<T> WeightedTable<T> {
    /// `label` names an entry in the error when its weight is zero.
    pub fn new<L>(entries: Vec<(T, u32)>, label: L) -> Result<Self, ArchetypeError>
    where
        L: Fn(&T) -> String,
    {
        if entries.is_empty() {
            return Err(ArchetypeError::EmptyTable);
        }

        let mut items = Vec::with_capacity(entries.len());
        let mut ends = Vec::with_capacity(entries.len());
        let mut total = 0u64;
        for (item, weight) in entries {
            if weight == 0 {
                return Err(ArchetypeError::ZeroWeight(label(&item)));
            }
            total += u64::from(weight);
            ends.push(total);
            items.push(item);
        }

        Ok(Self { items, ends, total })
    }

    pub fn total_weight(&self) -> u64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// The item whose slice contains `point`. Points past the end clamp to the last item.
    pub fn pick_at(&self, point: u64) -> &T {
        let idx = self.ends.partition_point(|&end| end <= point);
        &self.items[idx.min(self.items.len() - 1)]
    }

    pub fn pick<R>(&self, rng: &mut R) -> &T
    where
        R: RandomSource + ?Sized,
    {
        self.pick_at(rng.draw(self.total))
    }
}
