use mfpt_core::System;
use nalgebra::{DMatrix, DMatrixView, DVector};

/// LiNC/LiCN isomerization in rotor coordinates.
///
/// The Li atom moves around a rigid CN dimer; the degrees of freedom are
/// the Jacobi angle `theta` (column 0) and the distance `R` between Li and
/// the CN center of mass (column 1), with conjugate momenta in columns 2
/// and 3. Everything is in atomic units. The deeper LiNC well sits at
/// `theta = pi`, `R ~ 4.35`; the metastable LiCN well at `theta = 0`,
/// `R ~ 4.79`.
///
/// The potential is the Essers-Tennyson-Wormer surface (Chem. Phys. Lett.
/// 89, 223 (1982)): an electrostatic multipole series plus induction
/// terms, damped at short range and complemented by a fitted short-range
/// repulsion, all expanded in Legendre polynomials of `cos(theta)`.
///
/// `theta` is a rotation about the CN axis through the center of mass, so
/// its effective mass depends on `R`; the resulting `R`-gradient of the
/// kinetic energy shows up as a centrifugal `p_theta^2 / (mu_1 R^3)` term
/// in the radial force.
#[derive(Clone, Copy, Debug, Default)]
pub struct LithiumCyanide;

const ATOMIC_MASS: f64 = 1822.888486209; // m_e per u

const MASS_LI: f64 = 7.016003437 * ATOMIC_MASS;
const MASS_C: f64 = 12.0 * ATOMIC_MASS;
const MASS_N: f64 = 14.00307400446 * ATOMIC_MASS;
const MU_1: f64 = 1.0 / (1.0 / MASS_LI + 1.0 / (MASS_C + MASS_N));
const MU_2: f64 = 1.0 / (1.0 / MASS_C + 1.0 / MASS_N);
const DIST_NC: f64 = 2.186;

/// Multipole moments `<Q_L,0>` of the CN fragment.
const MOMENT_Q: [f64; 7] = [
    -1.00, -0.215135, -3.414573, -3.818815, -15.84152, -14.29374, -43.81719,
];

/// Induction coefficients `C_{l1,l2,L}`, indexed `[l1 + l2 - 2][L]`.
/// Symmetric pairs `C_{l1,l2,L} = C_{l2,l1,L}` are folded into one entry.
const INDUCTION: [[f64; 7]; 5] = [
    [-10.5271, 0.0, -3.17, 0.0, 0.0, 0.0, 0.0],
    [0.0, -20.62328, 0.0, 3.73208, 0.0, 0.0, 0.0],
    [-57.49396, 0.0, -106.8192, 0.0, 17.14139, 0.0, 0.0],
    [0.0, -202.8972, 0.0, -75.23207, 0.0, -28.45514, 0.0],
    [-458.2015, 0.0, -353.7347, 0.0, -112.6427, 0.0, -108.2786],
];

const DAMPING_R0: f64 = 1.900781;
const DAMPING_A: f64 = 1.515625;

/// Short-range fit parameters `(A_L, B_L, C_L)`.
const SHORT_RANGE: [[f64; 3]; 10] = [
    [-1.3832116, 0.14000706, 0.2078921600],
    [-2.9579132, 1.47977160, -0.0116130820],
    [-4.7420297, 1.81198620, -0.0171806800],
    [-1.8885299, 1.28750300, 0.0277284910],
    [-4.4143354, 2.32297140, -0.0706927420],
    [-4.0256496, 2.77538320, -0.1377197800],
    [-5.8425899, 3.48085290, -0.1863111400],
    [-2.6168114, 2.65559520, -0.0058815504],
    [-6.3446579, 4.34498010, -0.1529136800],
    [15.2022800, -6.54925370, 1.3025678000],
];

const N_LEGENDRE: usize = SHORT_RANGE.len();

/// `P_0(x) .. P_9(x)` via the three-term recurrence.
fn legendre(x: f64) -> [f64; N_LEGENDRE] {
    let mut p = [0.0; N_LEGENDRE];
    p[0] = 1.0;
    p[1] = x;
    p[2] = 1.5 * x * x - 0.5;
    for l in 3..N_LEGENDRE {
        let lf = l as f64;
        p[l] = (2.0 * lf - 1.0) / lf * x * p[l - 1] - (lf - 1.0) / lf * p[l - 2];
    }
    p
}

/// `P_0'(x) .. P_9'(x)` from the values of `P_l`.
fn legendre_prime(x: f64, p: &[f64; N_LEGENDRE]) -> [f64; N_LEGENDRE] {
    let mut dp = [0.0; N_LEGENDRE];
    dp[0] = 0.0;
    dp[1] = 1.0;
    dp[2] = 3.0 * x;
    for l in 3..N_LEGENDRE {
        dp[l] = l as f64 * p[l - 1] + x * dp[l - 1];
    }
    dp
}

/// Legendre-weighted bracket of the `R^-n` term of the long-range series:
/// the multipole moment `Q_{n-1}` plus the induction coefficients entering
/// at this inverse power.
fn series_bracket(p: &[f64; N_LEGENDRE], n: usize) -> f64 {
    let mut s = 0.0;
    if n <= MOMENT_Q.len() {
        s += MOMENT_Q[n - 1] * p[n - 1];
    }
    if n >= 4 {
        let row = &INDUCTION[n - 4];
        for (c, pl) in row.iter().zip(p.iter()) {
            s += c * pl;
        }
    }
    s
}

/// Electrostatic plus induction series `sum_n bracket_n / R^n`.
fn long_range(r: f64, p: &[f64; N_LEGENDRE]) -> f64 {
    let inv_r = 1.0 / r;
    let mut pow = 1.0;
    let mut res = 0.0;
    for n in 1..=8 {
        pow *= inv_r;
        res += pow * series_bracket(p, n);
    }
    res
}

/// `-d/dR` of [`long_range`]: `sum_n n * bracket_n / R^(n+1)`.
fn long_range_dr(r: f64, p: &[f64; N_LEGENDRE]) -> f64 {
    let inv_r = 1.0 / r;
    let mut pow = inv_r;
    let mut res = 0.0;
    for n in 1..=8 {
        pow *= inv_r;
        res += n as f64 * pow * series_bracket(p, n);
    }
    res
}

fn short_range(r: f64, p: &[f64; N_LEGENDRE]) -> f64 {
    let r2 = r * r;
    let mut res = 0.0;
    for (pl, [a, b, c]) in p.iter().zip(SHORT_RANGE.iter()) {
        res += pl * (-a - b * r - c * r2).exp();
    }
    res
}

/// `-d/dR` of [`short_range`].
fn short_range_dr(r: f64, p: &[f64; N_LEGENDRE]) -> f64 {
    let r2 = r * r;
    let mut res = 0.0;
    for (pl, [a, b, c]) in p.iter().zip(SHORT_RANGE.iter()) {
        res += pl * (b + 2.0 * c * r) * (-a - b * r - c * r2).exp();
    }
    res
}

fn damping(r: f64) -> f64 {
    let d = r - DAMPING_R0;
    1.0 - (-DAMPING_A * d * d).exp()
}

fn damping_dr(r: f64) -> f64 {
    let d = r - DAMPING_R0;
    2.0 * DAMPING_A * d * (-DAMPING_A * d * d).exp()
}

impl LithiumCyanide {
    pub fn new() -> Self {
        Self
    }

    /// Reduced mass of the Li/CN pair (the constant radial mass).
    pub fn radial_mass(&self) -> f64 {
        MU_1
    }
}

impl System for LithiumCyanide {
    fn dofs(&self) -> usize {
        2
    }

    fn potential(&self, phase: DMatrixView<f64>, _t: f64) -> DVector<f64> {
        DVector::from_fn(phase.nrows(), |i, _| {
            let (theta, r) = (phase[(i, 0)], phase[(i, 1)]);
            let p = legendre(theta.cos());
            long_range(r, &p) * damping(r) + short_range(r, &p)
        })
    }

    fn force(&self, phase: DMatrixView<f64>, _t: f64) -> DMatrix<f64> {
        let mut force = DMatrix::zeros(phase.nrows(), 2);
        for i in 0..phase.nrows() {
            let (theta, r) = (phase[(i, 0)], phase[(i, 1)]);
            let p_theta = phase[(i, 2)];
            let cos_theta = theta.cos();
            let p = legendre(cos_theta);
            // Chain rule: dP_l(cos theta)/d theta = -sin(theta) P_l'(cos theta).
            let mut dp = legendre_prime(cos_theta, &p);
            for v in &mut dp {
                *v *= -theta.sin();
            }

            force[(i, 0)] = -long_range(r, &dp) * damping(r) - short_range(r, &dp);
            force[(i, 1)] = long_range_dr(r, &p) * damping(r)
                - long_range(r, &p) * damping_dr(r)
                + short_range_dr(r, &p)
                + p_theta * p_theta / (MU_1 * r * r * r);
        }
        force
    }

    fn masses(&self, phase: DMatrixView<f64>) -> DMatrix<f64> {
        DMatrix::from_fn(phase.nrows(), 2, |i, j| {
            if j == 0 {
                let r = phase[(i, 1)];
                1.0 / (1.0 / (MU_1 * r * r) + 1.0 / (MU_2 * DIST_NC * DIST_NC))
            } else {
                MU_1
            }
        })
    }
}
