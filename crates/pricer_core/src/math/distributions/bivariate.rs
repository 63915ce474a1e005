//! Bivariate standard normal cumulative distribution function.
//!
//! Implements the algorithm of Genz (2004), "Numerical computation of
//! rectangular bivariate and trivariate normal and t probabilities",
//! Statistics and Computing 14, 251-260. Gauss-Legendre rules with 6, 12 or
//! 20 nodes are selected by |ρ|; for |ρ| ≥ 0.925 the singular part of the
//! integrand is removed analytically. Absolute accuracy is about 1e-15
//! across the whole domain, including ρ = ±1.

use super::normal::norm_cdf;
use std::f64::consts::PI;

const TWO_PI: f64 = 2.0 * PI;

// Gauss-Legendre nodes (negative half) and weights on [-1, 1].
const GL6_X: [f64; 3] = [
    -0.932_469_514_203_152_2,
    -0.661_209_386_466_264_7,
    -0.238_619_186_083_197,
];
const GL6_W: [f64; 3] = [
    0.171_324_492_379_170_5,
    0.360_761_573_048_138_4,
    0.467_913_934_572_690_4,
];

const GL12_X: [f64; 6] = [
    -0.981_560_634_246_719_1,
    -0.904_117_256_370_475,
    -0.769_902_674_194_305,
    -0.587_317_954_286_617_1,
    -0.367_831_498_998_180_2,
    -0.125_233_408_511_469_2,
];
const GL12_W: [f64; 6] = [
    0.047_175_336_386_511_77,
    0.106_939_325_995_318_3,
    0.160_078_328_543_346_4,
    0.203_167_426_723_065_9,
    0.233_492_536_538_354_7,
    0.249_147_045_813_402_9,
];

const GL20_X: [f64; 10] = [
    -0.993_128_599_185_094_9,
    -0.963_971_927_277_913_8,
    -0.912_234_428_251_325_9,
    -0.839_116_971_822_218_8,
    -0.746_331_906_460_150_8,
    -0.636_053_680_726_515,
    -0.510_867_001_950_827_1,
    -0.373_706_088_715_419_6,
    -0.227_785_851_141_645_1,
    -0.076_526_521_133_497_33,
];
const GL20_W: [f64; 10] = [
    0.017_614_007_139_152_12,
    0.040_601_429_800_386_94,
    0.062_672_048_334_109_06,
    0.083_276_741_576_704_75,
    0.101_930_119_817_240_4,
    0.118_194_531_961_518_4,
    0.131_688_638_449_176_6,
    0.142_096_109_318_382_1,
    0.149_172_986_472_603_7,
    0.152_753_387_130_725_9,
];

/// Bivariate standard normal CDF with a fixed correlation.
///
/// Convenience wrapper for models that evaluate many probabilities under
/// one correlation.
///
/// # Examples
/// ```
/// use pricer_core::math::distributions::BivariateNormal;
///
/// let biphi = BivariateNormal::new(0.5).unwrap();
/// // P(X <= 0, Y <= 0) = 1/4 + asin(ρ) / 2π
/// let expected = 0.25 + 0.5_f64.asin() / (2.0 * std::f64::consts::PI);
/// assert!((biphi.cdf(0.0, 0.0) - expected).abs() < 1e-15);
///
/// assert!(BivariateNormal::new(1.5).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BivariateNormal {
    rho: f64,
}

impl BivariateNormal {
    /// Create a bivariate normal with correlation `rho` in `[-1, 1]`.
    ///
    /// Returns `None` when `rho` is outside the interval or NaN.
    pub fn new(rho: f64) -> Option<Self> {
        if (-1.0..=1.0).contains(&rho) {
            Some(Self { rho })
        } else {
            None
        }
    }

    /// Correlation between the two marginals.
    #[inline]
    pub fn correlation(&self) -> f64 {
        self.rho
    }

    /// P(X <= x, Y <= y).
    #[inline]
    pub fn cdf(&self, x: f64, y: f64) -> f64 {
        bivariate_norm_cdf(x, y, self.rho)
    }
}

/// Bivariate standard normal cumulative distribution function.
///
/// Computes P(X <= x, Y <= y) where (X, Y) are standard normal with
/// correlation `rho` ∈ [-1, 1]. Infinite limits are accepted.
///
/// # Examples
/// ```
/// use pricer_core::math::distributions::{bivariate_norm_cdf, norm_cdf};
///
/// // Independence factorises
/// let p = bivariate_norm_cdf(0.3, -1.2, 0.0);
/// assert!((p - norm_cdf(0.3) * norm_cdf(-1.2)).abs() < 1e-15);
///
/// // Perfect correlation reduces to the smaller marginal
/// assert!((bivariate_norm_cdf(1.0, 2.0, 1.0) - norm_cdf(1.0)).abs() < 1e-15);
/// ```
pub fn bivariate_norm_cdf(x: f64, y: f64, rho: f64) -> f64 {
    if x.is_nan() || y.is_nan() || rho.is_nan() {
        return f64::NAN;
    }
    if x == f64::NEG_INFINITY || y == f64::NEG_INFINITY {
        return 0.0;
    }
    if x == f64::INFINITY {
        return norm_cdf(y);
    }
    if y == f64::INFINITY {
        return norm_cdf(x);
    }
    upper_orthant(-x, -y, rho.clamp(-1.0, 1.0)).clamp(0.0, 1.0)
}

/// P(X > h, Y > k) for finite `h`, `k`.
fn upper_orthant(h: f64, k: f64, r: f64) -> f64 {
    let (nodes, weights): (&[f64], &[f64]) = if r.abs() < 0.3 {
        (&GL6_X, &GL6_W)
    } else if r.abs() < 0.75 {
        (&GL12_X, &GL12_W)
    } else {
        (&GL20_X, &GL20_W)
    };

    let mut hk = h * k;

    if r.abs() < 0.925 {
        let hs = (h * h + k * k) / 2.0;
        let asr = r.asin();
        let mut bvn = 0.0;
        for (&x, &w) in nodes.iter().zip(weights) {
            for node in [x, -x] {
                let sn = (asr * (node + 1.0) / 2.0).sin();
                bvn += w * ((sn * hk - hs) / (1.0 - sn * sn)).exp();
            }
        }
        return bvn * asr / (2.0 * TWO_PI) + norm_cdf(-h) * norm_cdf(-k);
    }

    let mut k = k;
    if r < 0.0 {
        k = -k;
        hk = -hk;
    }

    let mut bvn = 0.0;
    if r.abs() < 1.0 {
        let a_s = (1.0 - r) * (1.0 + r);
        let mut a = a_s.sqrt();
        let bs = (h - k) * (h - k);
        let c = (4.0 - hk) / 8.0;
        let d = (12.0 - hk) / 16.0;

        bvn = a
            * (-(bs / a_s + hk) / 2.0).exp()
            * (1.0 - c * (bs - a_s) * (1.0 - d * bs / 5.0) / 3.0 + c * d * a_s * a_s / 5.0);
        if hk > -160.0 {
            let b = bs.sqrt();
            bvn -= (-hk / 2.0).exp()
                * TWO_PI.sqrt()
                * norm_cdf(-b / a)
                * b
                * (1.0 - c * bs * (1.0 - d * bs / 5.0) / 3.0);
        }

        a /= 2.0;
        for (&x, &w) in nodes.iter().zip(weights) {
            for node in [x, -x] {
                let xs = (a * (node + 1.0)).powi(2);
                let rs = (1.0 - xs).sqrt();
                bvn += a
                    * w
                    * (-(bs / xs + hk) / 2.0).exp()
                    * ((-hk * (1.0 - rs) / (2.0 * (1.0 + rs))).exp() / rs
                        - (1.0 + c * xs * (1.0 + d * xs)));
            }
        }
        bvn = -bvn / TWO_PI;
    }

    if r > 0.0 {
        bvn + norm_cdf(-h.max(k))
    } else {
        let mut bvn = -bvn;
        if k > h {
            if h < 0.0 {
                bvn += norm_cdf(k) - norm_cdf(h);
            } else {
                bvn += norm_cdf(-h) - norm_cdf(-k);
            }
        }
        bvn
    }
}
