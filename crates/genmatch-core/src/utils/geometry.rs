use std::f64::consts::{PI, TAU};

use crate::utils::vectors::Vec4;

/// Anything with a direction in the detector's $`(\eta, \phi)`$ plane.
pub trait Direction {
    /// Pseudorapidity.
    fn eta(&self) -> f64;
    /// Azimuthal angle.
    fn phi(&self) -> f64;
}

impl Direction for Vec4 {
    fn eta(&self) -> f64 {
        Vec4::eta(self)
    }
    fn phi(&self) -> f64 {
        Vec4::phi(self)
    }
}

impl<T: Direction + ?Sized> Direction for &T {
    fn eta(&self) -> f64 {
        (**self).eta()
    }
    fn phi(&self) -> f64 {
        (**self).phi()
    }
}

/// The difference $`\phi_1 - \phi_2`$ wrapped to $`(-\pi, \pi]`$.
pub fn delta_phi(phi1: f64, phi2: f64) -> f64 {
    let mut dphi = (phi1 - phi2) % TAU;
    if dphi > PI {
        dphi -= TAU;
    } else if dphi <= -PI {
        dphi += TAU;
    }
    dphi
}

/// The angular separation $`\Delta R = \sqrt{\Delta\eta^2 + \Delta\phi^2}`$.
pub fn delta_r<A: Direction + ?Sized, B: Direction + ?Sized>(a: &A, b: &B) -> f64 {
    let deta = a.eta() - b.eta();
    let dphi = delta_phi(a.phi(), b.phi());
    (deta * deta + dphi * dphi).sqrt()
}

/// Fixed-radius association: `true` when $`\Delta R(a, b) < `$ `radius`.
pub fn is_matched<A: Direction + ?Sized, B: Direction + ?Sized>(a: &A, b: &B, radius: f64) -> bool {
    delta_r(a, b) < radius
}

/// Index of the candidate closest to `axis` in $`\Delta R`$, or [`None`] if there are no
/// candidates. Ties resolve to the earliest candidate.
pub fn closest<A: Direction + ?Sized, B: Direction>(axis: &A, candidates: &[B]) -> Option<usize> {
    candidates
        .iter()
        .map(|candidate| delta_r(axis, candidate))
        .enumerate()
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(index, _)| index)
}

/// Number of `candidates` within `radius` of `axis`.
pub fn count_matched<A, B, I>(axis: &A, candidates: I, radius: f64) -> usize
where
    A: Direction + ?Sized,
    B: Direction,
    I: IntoIterator<Item = B>,
{
    candidates
        .into_iter()
        .filter(|candidate| is_matched(axis, candidate, radius))
        .count()
}

/// `true` if any of the `candidates` lies within `radius` of `axis`.
pub fn any_matched<A, B, I>(axis: &A, candidates: I, radius: f64) -> bool
where
    A: Direction + ?Sized,
    B: Direction,
    I: IntoIterator<Item = B>,
{
    candidates
        .into_iter()
        .any(|candidate| is_matched(axis, &candidate, radius))
}
