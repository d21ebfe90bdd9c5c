//! Cubic lattice of `f64` cells with periodic neighbor access.

/// `n x n x n` field stored row-major in `(x, y, z)` order.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid3 {
    n: usize,
    data: Vec<f64>,
}

impl Grid3 {
    pub fn filled(n: usize, value: f64) -> Self {
        Self {
            n,
            data: vec![value; n * n * n],
        }
    }

    /// Wrap an existing buffer; `None` unless `data.len() == n^3`.
    pub fn from_vec(n: usize, data: Vec<f64>) -> Option<Self> {
        (data.len() == n * n * n).then_some(Self { n, data })
    }

    pub fn side(&self) -> usize {
        self.n
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.n + y) * self.n + z
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> f64 {
        self.data[self.index(x, y, z)]
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, value: f64) {
        let i = self.index(x, y, z);
        self.data[i] = value;
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn mean(&self) -> f64 {
        lattice_metrics::mean(&self.data)
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn clamp_unit(&mut self) {
        for v in &mut self.data {
            *v = v.clamp(0.0, 1.0);
        }
    }

    /// Mean of the six face neighbors of every cell, wrapping at the
    /// boundaries.
    pub fn neighbor_mean(&self) -> Grid3 {
        let n = self.n;
        let mut out = Vec::with_capacity(self.data.len());
        for x in 0..n {
            let (xp, xm) = ((x + 1) % n, (x + n - 1) % n);
            for y in 0..n {
                let (yp, ym) = ((y + 1) % n, (y + n - 1) % n);
                for z in 0..n {
                    let (zp, zm) = ((z + 1) % n, (z + n - 1) % n);
                    let sum = self.get(xp, y, z)
                        + self.get(xm, y, z)
                        + self.get(x, yp, z)
                        + self.get(x, ym, z)
                        + self.get(x, y, zp)
                        + self.get(x, y, zm);
                    out.push(sum / 6.0);
                }
            }
        }
        Grid3 { n, data: out }
    }
}
