//! Connected-component labeling of boolean lattices.
//!
//! Halo finding depends on a [`ComponentLabeler`] rather than a fixed
//! implementation, so the halo pipeline can run (and be tested) with
//! labeling switched off. [`UnavailableLabeler`] reports zero components
//! and marks the capability as absent in the run summary.

/// Per-cell component labels (`0` = background, `1..=count` = component).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labeling {
    pub labels: Vec<u32>,
    pub count: usize,
}

impl Labeling {
    /// All-background labeling of `len` cells.
    pub fn empty(len: usize) -> Self {
        Self {
            labels: vec![0; len],
            count: 0,
        }
    }

    /// Cell count of each component, indexed by `label - 1`. Labels above
    /// `count` are ignored.
    pub fn component_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.count];
        for &label in &self.labels {
            let Some(i) = (label as usize).checked_sub(1) else {
                continue;
            };
            if let Some(size) = sizes.get_mut(i) {
                *size += 1;
            }
        }
        sizes
    }
}

/// Labels connected regions of `true` cells in an `n^3` row-major mask.
pub trait ComponentLabeler {
    /// Short name recorded in logs.
    fn name(&self) -> &'static str;

    /// Whether this labeler actually finds components.
    fn is_available(&self) -> bool {
        true
    }

    /// Returns one label per mask cell, each in `0..=count`.
    fn label(&self, mask: &[bool], n: usize) -> Labeling;
}

/// 6-connectivity (shared faces only), no wraparound at the boundaries.
/// Labels are assigned in raster order of each component's first cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaceConnectedLabeler;

impl ComponentLabeler for FaceConnectedLabeler {
    fn name(&self) -> &'static str {
        "face_connected"
    }

    fn label(&self, mask: &[bool], n: usize) -> Labeling {
        let len = mask.len();
        if n == 0 || len != n * n * n {
            return Labeling::empty(len);
        }

        let mut sets = DisjointSets::new(len);
        let plane = n * n;
        for x in 0..n {
            for y in 0..n {
                for z in 0..n {
                    let i = (x * n + y) * n + z;
                    if !mask[i] {
                        continue;
                    }
                    if x + 1 < n && mask[i + plane] {
                        sets.union(i, i + plane);
                    }
                    if y + 1 < n && mask[i + n] {
                        sets.union(i, i + n);
                    }
                    if z + 1 < n && mask[i + 1] {
                        sets.union(i, i + 1);
                    }
                }
            }
        }

        let mut root_label = vec![0u32; len];
        let mut labels = vec![0u32; len];
        let mut count = 0usize;
        for i in 0..len {
            if !mask[i] {
                continue;
            }
            let root = sets.find(i);
            if root_label[root] == 0 {
                count += 1;
                root_label[root] = count as u32;
            }
            labels[i] = root_label[root];
        }

        Labeling { labels, count }
    }
}

/// Stand-in used when component labeling is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableLabeler;

impl ComponentLabeler for UnavailableLabeler {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn label(&self, mask: &[bool], _n: usize) -> Labeling {
        Labeling::empty(mask.len())
    }
}

// ---------------------------------------------------------------------------
// Union-find
// ---------------------------------------------------------------------------

struct DisjointSets {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            // Path halving
            let next = self.parent[x];
            self.parent[x] = self.parent[next];
            x = next;
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        let (big, small) = if self.rank[ra] >= self.rank[rb] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[small] = big;
        if self.rank[big] == self.rank[small] {
            self.rank[big] = self.rank[big].saturating_add(1);
        }
    }
}
