//! Distance transforms and service coverage surfaces over cell masks.

use {
    crate::domain::Mask,
    ndarray::{Array1, Array2, Axis},
};

/// Euclidean distance, in cells, from every cell to the nearest `true` cell.
/// `true` cells are 0. A mask with no `true` cell is infinitely far everywhere.
///
/// Exact separable transform (Felzenszwalb & Huttenlocher): a 1D lower
/// envelope of parabolas down every column, then along every row.
pub fn distance_to_nearest(mask: &Mask) -> Array2<f64> {
    let (rows, cols) = mask.dim();
    if !mask.iter().any(|&m| m) {
        return Array2::from_elem((rows, cols), f64::INFINITY);
    }

    // Larger than any real squared distance, small enough to stay exact
    let far = (rows * rows + cols * cols) as f64 + 1.0;
    let mut sq = mask.mapv(|m| if m { 0.0 } else { far });

    for axis in [Axis(0), Axis(1)] {
        for mut lane in sq.lanes_mut(axis) {
            let squared = lower_envelope(&lane.to_vec());
            lane.assign(&Array1::from(squared));
        }
    }
    sq.mapv(f64::sqrt)
}

fn lower_envelope(f: &[f64]) -> Vec<f64> {
    let n = f.len();
    if n == 0 {
        return Vec::new();
    }
    let mut d = vec![0.0; n];
    let mut v = vec![0usize; n];
    let mut z = vec![0.0; n + 1];
    let mut k = 0;
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;

    let intersect = |q: usize, p: usize| {
        let (qf, pf) = (q as f64, p as f64);
        ((f[q] + qf * qf) - (f[p] + pf * pf)) / (2.0 * (qf - pf))
    };

    for q in 1..n {
        let mut s = intersect(q, v[k]);
        while s <= z[k] {
            k -= 1;
            s = intersect(q, v[k]);
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }

    k = 0;
    for (q, out) in d.iter_mut().enumerate() {
        while z[k + 1] < q as f64 {
            k += 1;
        }
        let dq = q as f64 - v[k] as f64;
        *out = dq * dq + f[v[k]];
    }
    d
}

/// `exp(-distance * pixel_size / service_radius)`: 1 on the mask, decaying away
/// from it, 0 everywhere when the mask is empty.
pub fn coverage_surface(mask: &Mask, pixel_size: f64, service_radius: f64) -> Array2<f64> {
    decay_surface(&distance_to_nearest(mask), pixel_size, service_radius)
}

/// `exp(-distance * pixel_size / radius)` for a precomputed distance field.
pub fn decay_surface(distance: &Array2<f64>, pixel_size: f64, radius: f64) -> Array2<f64> {
    distance.mapv(|d| (-d * pixel_size / radius).exp())
}

/// Odd `kernel_size` square centred on the row-major cell `index`, clipped to the grid.
pub fn square_mask(shape: (usize, usize), index: usize, kernel_size: usize) -> Mask {
    let (rows, cols) = shape;
    let mut mask = Array2::from_elem(shape, false);
    if cols == 0 || index >= rows * cols {
        return mask;
    }
    let (r, c) = (index / cols, index % cols);
    let half = kernel_size / 2;
    let r0 = r.saturating_sub(half);
    let r1 = (r + half + 1).min(rows);
    let c0 = c.saturating_sub(half);
    let c1 = (c + half + 1).min(cols);
    mask.slice_mut(ndarray::s![r0..r1, c0..c1]).fill(true);
    mask
}

/// Cellwise `a OR b`.
pub fn union(a: &Mask, b: &Mask) -> Mask {
    ndarray::Zip::from(a).and(b).map_collect(|&x, &y| x || y)
}

/// Cellwise `a AND NOT b`.
pub fn difference(a: &Mask, b: &Mask) -> Mask {
    ndarray::Zip::from(a).and(b).map_collect(|&x, &y| x && !y)
}
