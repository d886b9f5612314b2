use auto_ops::{impl_op_ex, impl_op_ex_commutative};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A four-momentum stored in Cartesian form, with the energy as the time-like component `t`.
///
/// Collider quantities (`pt`, `eta`, `phi`, `m`) are derived on demand. Use
/// [`Vec4::from_pt_eta_phi_m`] to build one from the cylindrical coordinates stored in most
/// ntuples.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec4 {
    /// Momentum along the x-axis.
    pub x: f64,
    /// Momentum along the y-axis.
    pub y: f64,
    /// Momentum along the beam (z) axis.
    pub z: f64,
    /// Energy.
    pub t: f64,
}

impl Display for Vec4 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_p4_string())
    }
}

impl Vec4 {
    /// Create a new [`Vec4`] from its Cartesian components.
    pub fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self {
            x: px,
            y: py,
            z: pz,
            t: e,
        }
    }

    /// Create a new [`Vec4`] from transverse momentum, pseudorapidity, azimuth and mass.
    pub fn from_pt_eta_phi_m(pt: f64, eta: f64, phi: f64, m: f64) -> Self {
        let px = pt * phi.cos();
        let py = pt * phi.sin();
        let pz = pt * eta.sinh();
        let p2 = px * px + py * py + pz * pz;
        Self::new(px, py, pz, (p2 + m * m).sqrt())
    }

    /// Create a massless [`Vec4`] from a three-momentum.
    pub fn massless(px: f64, py: f64, pz: f64) -> Self {
        Self::new(px, py, pz, (px * px + py * py + pz * pz).sqrt())
    }

    pub fn px(&self) -> f64 {
        self.x
    }
    pub fn py(&self) -> f64 {
        self.y
    }
    pub fn pz(&self) -> f64 {
        self.z
    }
    pub fn e(&self) -> f64 {
        self.t
    }

    pub fn pt2(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }
    pub fn pt(&self) -> f64 {
        self.pt2().sqrt()
    }
    pub fn p2(&self) -> f64 {
        self.pt2() + self.z * self.z
    }
    pub fn p(&self) -> f64 {
        self.p2().sqrt()
    }

    /// The squared invariant mass, $`t^2 - |\vec{p}|^2`$.
    pub fn m2(&self) -> f64 {
        self.t * self.t - self.p2()
    }

    /// The invariant mass. Space-like vectors (from rounding or smearing) get a negative mass,
    /// $`-\sqrt{-m^2}`$, rather than `NaN`.
    pub fn m(&self) -> f64 {
        let m2 = self.m2();
        if m2 >= 0.0 {
            m2.sqrt()
        } else {
            -(-m2).sqrt()
        }
    }

    /// The pseudorapidity. Vectors along the beam axis get $`\pm 10^{10}`$ instead of an
    /// infinite value.
    pub fn eta(&self) -> f64 {
        let pt = self.pt();
        if pt > 0.0 {
            (self.z / pt).asinh()
        } else if self.z == 0.0 {
            0.0
        } else {
            self.z.signum() * 1e10
        }
    }

    /// The azimuthal angle in $`(-\pi, \pi]`$.
    pub fn phi(&self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn to_p4_string(&self) -> String {
        format!(
            "[e = {:.5}; p = ({:.5}, {:.5}, {:.5}); m = {:.5}]",
            self.t,
            self.x,
            self.y,
            self.z,
            self.m()
        )
    }

    pub fn add(&self, other: &Self) -> Self {
        Self::new(
            self.x + other.x,
            self.y + other.y,
            self.z + other.z,
            self.t + other.t,
        )
    }
    pub fn sub(&self, other: &Self) -> Self {
        Self::new(
            self.x - other.x,
            self.y - other.y,
            self.z - other.z,
            self.t - other.t,
        )
    }
    pub fn neg(&self) -> Self {
        Self::new(-self.x, -self.y, -self.z, -self.t)
    }
    pub fn scale(&self, factor: f64) -> Self {
        Self::new(
            self.x * factor,
            self.y * factor,
            self.z * factor,
            self.t * factor,
        )
    }
}

impl_op_ex!(+ |a: &Vec4, b: &Vec4| -> Vec4 { a.add(b) });
impl_op_ex!(-|a: &Vec4, b: &Vec4| -> Vec4 { a.sub(b) });
impl_op_ex!(-|a: &Vec4| -> Vec4 { a.neg() });
impl_op_ex_commutative!(*|a: &Vec4, b: &f64| -> Vec4 { a.scale(*b) });

impl std::iter::Sum<Vec4> for Vec4 {
    fn sum<I: Iterator<Item = Vec4>>(iter: I) -> Self {
        iter.fold(Vec4::default(), |acc, p4| acc + p4)
    }
}

impl<'a> std::iter::Sum<&'a Vec4> for Vec4 {
    fn sum<I: Iterator<Item = &'a Vec4>>(iter: I) -> Self {
        iter.fold(Vec4::default(), |acc, p4| acc + p4)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_vec_sums() {
        let a = Vec4::new(1.0, 2.0, 3.0, 10.0);
        let b = Vec4::new(4.0, 5.0, 6.0, 20.0);
        let c = a + b;
        assert_eq!(c, Vec4::new(5.0, 7.0, 9.0, 30.0));
        assert_eq!(c - b, a);
        assert_eq!(-a, Vec4::new(-1.0, -2.0, -3.0, -10.0));
        assert_eq!(2.0 * a, a * 2.0);
        assert_eq!([a, b].iter().sum::<Vec4>(), c);
    }

    #[test]
    fn test_four_momentum_basics() {
        let p = Vec4::new(3.0, 4.0, 5.0, 10.0);
        assert_relative_eq!(p.pt(), 5.0);
        assert_relative_eq!(p.p(), 50.0_f64.sqrt());
        assert_relative_eq!(p.m2(), 50.0);
        assert_relative_eq!(p.m(), 50.0_f64.sqrt());
        assert_relative_eq!(p.phi(), 4.0_f64.atan2(3.0));
        assert_relative_eq!(p.eta(), (1.0_f64).asinh());
    }

    #[test]
    fn test_cylindrical_round_trip() {
        let p = Vec4::from_pt_eta_phi_m(250.0, -1.3, 2.7, 80.4);
        assert_relative_eq!(p.pt(), 250.0, epsilon = 1e-9);
        assert_relative_eq!(p.eta(), -1.3, epsilon = 1e-9);
        assert_relative_eq!(p.phi(), 2.7, epsilon = 1e-9);
        assert_relative_eq!(p.m(), 80.4, epsilon = 1e-6);
    }

    #[test]
    fn test_degenerate_directions() {
        let along_beam = Vec4::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(along_beam.eta(), 1e10);
        assert_eq!(Vec4::default().eta(), 0.0);
        let spacelike = Vec4::new(3.0, 0.0, 4.0, 3.0);
        assert_relative_eq!(spacelike.m(), -4.0);
        assert_relative_eq!(Vec4::massless(3.0, 4.0, 0.0).m(), 0.0);
    }
}
