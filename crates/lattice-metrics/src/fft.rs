//! Separable FFT over cubic (3D) and square (2D) grids.

use rustfft::{FftDirection, FftPlanner, num_complex::Complex};

/// Integer wavenumber of index `i` on an axis of length `n`, in the same
/// order as numpy's `fftfreq(n) * n`: `0, 1, .., (n-1)/2` then negatives.
pub fn fft_frequency(i: usize, n: usize) -> f64 {
    if i <= (n.saturating_sub(1)) / 2 {
        i as f64
    } else {
        i as f64 - n as f64
    }
}

/// `|k|` for every flattened index of an `n^dims` row-major grid.
pub fn radial_wavenumbers(n: usize, dims: usize) -> Vec<f64> {
    let len = n.pow(dims as u32);
    let freqs: Vec<f64> = (0..n).map(|i| fft_frequency(i, n)).collect();
    let mut out = Vec::with_capacity(len);
    for idx in 0..len {
        let mut rest = idx;
        let mut k2 = 0.0;
        for _ in 0..dims {
            let k = freqs[rest % n];
            k2 += k * k;
            rest /= n;
        }
        out.push(k2.sqrt());
    }
    out
}

/// In-place FFT along every axis of an `n^dims` row-major grid.
///
/// The inverse transform is scaled by `1 / n^dims` so that a forward then
/// inverse pass returns the input.
pub fn fft_nd(buffer: &mut [Complex<f64>], n: usize, dims: usize, direction: FftDirection) {
    let len = n.pow(dims as u32);
    debug_assert_eq!(buffer.len(), len, "buffer must hold n^dims values");
    if n == 0 || dims == 0 || buffer.len() != len {
        return;
    }

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft(n, direction);
    let mut scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

    // Last axis is contiguous: rustfft handles a buffer of back-to-back lines.
    fft.process_with_scratch(buffer, &mut scratch);

    let mut line = vec![Complex::new(0.0, 0.0); n];
    for axis in (0..dims - 1).rev() {
        let stride = n.pow((dims - 1 - axis) as u32);
        for base in 0..len {
            if (base / stride) % n != 0 {
                continue;
            }
            for (i, slot) in line.iter_mut().enumerate() {
                *slot = buffer[base + i * stride];
            }
            fft.process_with_scratch(&mut line, &mut scratch);
            for (i, value) in line.iter().enumerate() {
                buffer[base + i * stride] = *value;
            }
        }
    }

    if direction == FftDirection::Inverse {
        let scale = 1.0 / len as f64;
        for value in buffer.iter_mut() {
            *value *= scale;
        }
    }
}
