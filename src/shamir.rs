//! Shamir threshold secret sharing over a prime field.
//!
//! A secret in `[0, p)` is encoded as the constant term of a random
//! polynomial of degree `t - 1` over `Z_p`; party `i` holds the evaluation
//! at `x = i` (x-coordinates run `1..=N`). Any `t` shares reconstruct the
//! secret by Lagrange interpolation at zero, while any `t - 1` shares are
//! information-theoretically independent of it. Sharing is linear: shares
//! of two secrets under the same parameters sum pointwise to shares of the
//! sum, which is what lets parties aggregate secrets without ever
//! reconstructing an individual input.

use std::collections::{HashMap, HashSet};

use num_bigint_dig::{prime::probably_prime, BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::arith;
use crate::error::{Error, Result};

/// Miller-Rabin rounds used when validating the field modulus.
const PRIMALITY_ROUNDS: usize = 20;

/// Configuration of one secret-sharing instance: the prime field, the
/// reconstruction threshold `t` and the total number of shares `N`.
///
/// Fixed for the lifetime of the instance; shares produced under different
/// parameters must never be mixed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharingParameters {
    /// The prime field modulus. Must exceed any expected aggregate value.
    pub modulus: BigUint,
    /// Minimum number of shares needed to reconstruct.
    pub threshold: u32,
    /// Total number of shares dealt.
    pub parties: u32,
}

impl SharingParameters {
    /// Validates and constructs sharing parameters.
    ///
    /// # Errors
    /// `InvalidParameter` unless `1 <= threshold <= parties`, the modulus is
    /// a probable prime, and the modulus exceeds `parties` (so the
    /// x-coordinates `1..=N` are distinct and nonzero in the field).
    pub fn new(modulus: BigUint, threshold: u32, parties: u32) -> Result<Self> {
        if parties == 0 {
            return Err(Error::InvalidParameter(
                "at least one party is required".into(),
            ));
        }
        if threshold == 0 || threshold > parties {
            return Err(Error::InvalidParameter(format!(
                "threshold must satisfy 1 <= t <= {parties}, got {threshold}"
            )));
        }
        if modulus <= BigUint::from(parties) {
            return Err(Error::InvalidParameter(format!(
                "modulus must exceed the number of parties ({parties})"
            )));
        }
        if !probably_prime(&modulus, PRIMALITY_ROUNDS) {
            return Err(Error::InvalidParameter("modulus must be prime".into()));
        }
        Ok(SharingParameters {
            modulus,
            threshold,
            parties,
        })
    }

    /// Largest signed value representable by [`encode_signed`], `p / 2`.
    ///
    /// [`encode_signed`]: SharingParameters::encode_signed
    pub fn max_signed(&self) -> BigUint {
        &self.modulus / 2u32
    }

    /// Maps a signed value in `[-p/2, p/2]` to its field representative.
    ///
    /// # Errors
    /// `InvalidParameter` if the value falls outside the supported range.
    pub fn encode_signed(&self, value: &BigInt) -> Result<BigUint> {
        let max = BigInt::from(self.max_signed());
        let min = -&max;
        if value < &min || value > &max {
            return Err(Error::InvalidParameter(format!(
                "value {value} outside the supported range [{min}, {max}]"
            )));
        }
        let encoded = value.mod_floor(&BigInt::from(self.modulus.clone()));
        Ok(encoded
            .to_biguint()
            .expect("mod_floor result is non-negative"))
    }

    /// Inverse of [`encode_signed`]: field elements above `p / 2` decode as
    /// negative values.
    ///
    /// # Errors
    /// `InvalidParameter` if `encoded` is not a field element.
    ///
    /// [`encode_signed`]: SharingParameters::encode_signed
    pub fn decode_signed(&self, encoded: &BigUint) -> Result<BigInt> {
        if encoded >= &self.modulus {
            return Err(Error::InvalidParameter(
                "encoded value is not a field element".into(),
            ));
        }
        let value = BigInt::from(encoded.clone());
        if *encoded <= self.max_signed() {
            Ok(value)
        } else {
            Ok(value - BigInt::from(self.modulus.clone()))
        }
    }
}

/// One party's fragment of a secret: the polynomial evaluation `y = f(x)`
/// at this party's nonzero x-coordinate.
///
/// The value is wiped from memory on drop; discard shares once a protocol
/// run is over.
#[derive(Clone, Debug, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Share {
    /// The x-coordinate, in `1..=N`, unique per secret within an instance.
    pub index: u32,
    /// The y-value in `[0, p)`.
    pub value: BigUint,
}

/// Splits `secret` into `N` shares, any `threshold` of which reconstruct it.
///
/// Draws the `t - 1` non-constant polynomial coefficients uniformly at
/// random, so fewer than `t` shares hold no information about the secret by
/// construction.
///
/// # Errors
/// `InvalidParameter` if `secret >= p`.
pub fn share<R: RngCore + CryptoRng>(
    secret: &BigUint,
    params: &SharingParameters,
    rng: &mut R,
) -> Result<Vec<Share>> {
    if secret >= &params.modulus {
        return Err(Error::InvalidParameter(
            "secret must be in [0, p)".into(),
        ));
    }

    let mut coefficients = Vec::with_capacity(params.threshold as usize);
    coefficients.push(secret.clone());
    for _ in 1..params.threshold {
        coefficients.push(arith::sample_below(rng, &params.modulus)?);
    }

    let shares = (1..=params.parties)
        .map(|x| Share {
            index: x,
            value: eval_poly(&coefficients, x, &params.modulus),
        })
        .collect();
    coefficients.zeroize();
    Ok(shares)
}

/// Reconstructs the secret from at least `threshold` distinct-index shares
/// via Lagrange interpolation at `x = 0`.
///
/// All supplied shares participate; a superset of a valid quorum yields the
/// same secret.
///
/// # Errors
/// `DuplicateShareIndex` if two shares carry the same x-coordinate,
/// `InsufficientShares` if fewer than `threshold` are supplied, and
/// `InvalidParameter` for an index of zero or a y-value outside the field.
pub fn reconstruct(shares: &[Share], params: &SharingParameters) -> Result<BigUint> {
    let mut seen = HashSet::new();
    for s in shares {
        if !seen.insert(s.index) {
            return Err(Error::DuplicateShareIndex(s.index));
        }
        validate_share(s, params)?;
    }
    if shares.len() < params.threshold as usize {
        return Err(Error::InsufficientShares {
            provided: shares.len(),
            required: params.threshold as usize,
        });
    }

    let p = &params.modulus;
    let mut secret = BigUint::zero();
    for (i, si) in shares.iter().enumerate() {
        let xi = BigUint::from(si.index);
        // The basis weight at x = 0 simplifies to
        // prod_{j != i} x_j / (x_j - x_i): the per-factor signs cancel.
        let mut numerator = BigUint::one();
        let mut denominator = BigUint::one();
        for (j, sj) in shares.iter().enumerate() {
            if i == j {
                continue;
            }
            let xj = BigUint::from(sj.index);
            numerator = numerator * &xj % p;
            denominator = denominator * sub_mod(&xj, &xi, p) % p;
        }
        let weight = numerator * arith::modinv(&denominator, p)? % p;
        secret = (secret + &si.value * weight) % p;
    }
    Ok(secret)
}

/// Pointwise sum of two share sets: shares of `a` plus shares of `b` are
/// shares of `(a + b) mod p`, with no reconstruction of either input.
///
/// Shares are matched by x-coordinate, so ordering does not matter, but the
/// two sets must cover the same coordinates and stem from the same
/// parameters.
///
/// # Errors
/// `ShareSetMismatch` if the index sets differ.
pub fn add_shares(a: &[Share], b: &[Share], params: &SharingParameters) -> Result<Vec<Share>> {
    if a.len() != b.len() {
        return Err(Error::ShareSetMismatch(format!(
            "left has {} shares, right has {}",
            a.len(),
            b.len()
        )));
    }
    let by_index: HashMap<u32, &BigUint> = b.iter().map(|s| (s.index, &s.value)).collect();

    let mut out = Vec::with_capacity(a.len());
    for sa in a {
        validate_share(sa, params)?;
        let vb = by_index.get(&sa.index).ok_or_else(|| {
            Error::ShareSetMismatch(format!("index {} missing from right-hand set", sa.index))
        })?;
        out.push(Share {
            index: sa.index,
            value: (&sa.value + *vb) % &params.modulus,
        });
    }
    Ok(out)
}

/// Adds a public constant to the shared secret by shifting every share:
/// the result reconstructs to `(secret + scalar) mod p`.
///
/// # Errors
/// `InvalidParameter` if the scalar is not a field element.
pub fn add_scalar(
    shares: &[Share],
    scalar: &BigUint,
    params: &SharingParameters,
) -> Result<Vec<Share>> {
    validate_scalar(scalar, params)?;
    shares
        .iter()
        .map(|s| {
            validate_share(s, params)?;
            Ok(Share {
                index: s.index,
                value: (&s.value + scalar) % &params.modulus,
            })
        })
        .collect()
}

/// Multiplies the shared secret by a public constant: the result
/// reconstructs to `(secret * scalar) mod p`.
///
/// # Errors
/// `InvalidParameter` if the scalar is not a field element.
pub fn mul_scalar(
    shares: &[Share],
    scalar: &BigUint,
    params: &SharingParameters,
) -> Result<Vec<Share>> {
    validate_scalar(scalar, params)?;
    shares
        .iter()
        .map(|s| {
            validate_share(s, params)?;
            Ok(Share {
                index: s.index,
                value: (&s.value * scalar) % &params.modulus,
            })
        })
        .collect()
}

/// Horner evaluation of the sharing polynomial at a small x-coordinate.
fn eval_poly(coefficients: &[BigUint], x: u32, modulus: &BigUint) -> BigUint {
    let x = BigUint::from(x);
    let mut acc = BigUint::zero();
    for c in coefficients.iter().rev() {
        acc = (acc * &x + c) % modulus;
    }
    acc
}

/// `(a - b) mod p` for field elements `a, b < p`.
fn sub_mod(a: &BigUint, b: &BigUint, p: &BigUint) -> BigUint {
    ((p + a) - b) % p
}

fn validate_share(s: &Share, params: &SharingParameters) -> Result<()> {
    if s.index == 0 {
        return Err(Error::InvalidParameter(
            "share index zero would leak the secret".into(),
        ));
    }
    if s.value >= params.modulus {
        return Err(Error::InvalidParameter(format!(
            "share value at index {} is not a field element",
            s.index
        )));
    }
    Ok(())
}

fn validate_scalar(scalar: &BigUint, params: &SharingParameters) -> Result<()> {
    if scalar >= &params.modulus {
        return Err(Error::InvalidParameter(
            "scalar must be in [0, p)".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    /// The Mersenne prime 2^61 - 1.
    fn field() -> BigUint {
        (BigUint::one() << 61) - BigUint::one()
    }

    fn params(t: u32, n: u32) -> SharingParameters {
        SharingParameters::new(field(), t, n).unwrap()
    }

    fn test_rng() -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(0x7368_616d)
    }

    #[test]
    fn parameter_validation() {
        assert!(matches!(
            SharingParameters::new(field(), 0, 3),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            SharingParameters::new(field(), 4, 3),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            SharingParameters::new(BigUint::from(15u32), 2, 3),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            SharingParameters::new(BigUint::from(3u32), 2, 3),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn any_quorum_reconstructs() {
        let params = params(3, 5);
        let mut rng = test_rng();
        let secret = BigUint::from(123_456_789u64);
        let shares = share(&secret, &params, &mut rng).unwrap();
        assert_eq!(shares.len(), 5);

        assert_eq!(reconstruct(&shares[..3], &params).unwrap(), secret);
        assert_eq!(reconstruct(&shares[2..], &params).unwrap(), secret);
        let scattered = vec![shares[0].clone(), shares[2].clone(), shares[4].clone()];
        assert_eq!(reconstruct(&scattered, &params).unwrap(), secret);
        // A superset of a quorum agrees.
        assert_eq!(reconstruct(&shares, &params).unwrap(), secret);
    }

    #[test]
    fn too_few_or_duplicate_shares_fail() {
        let params = params(3, 5);
        let mut rng = test_rng();
        let shares = share(&BigUint::from(99u32), &params, &mut rng).unwrap();

        assert!(matches!(
            reconstruct(&shares[..2], &params),
            Err(Error::InsufficientShares {
                provided: 2,
                required: 3
            })
        ));

        let dup = vec![shares[0].clone(), shares[1].clone(), shares[0].clone()];
        assert!(matches!(
            reconstruct(&dup, &params),
            Err(Error::DuplicateShareIndex(1))
        ));
    }

    #[test]
    fn shares_are_linear() {
        let params = params(2, 3);
        let mut rng = test_rng();
        let a = BigUint::from(10u32);
        let b = BigUint::from(20u32);
        let shares_a = share(&a, &params, &mut rng).unwrap();
        let shares_b = share(&b, &params, &mut rng).unwrap();

        let summed = add_shares(&shares_a, &shares_b, &params).unwrap();
        assert_eq!(
            reconstruct(&summed[..2], &params).unwrap(),
            BigUint::from(30u32)
        );
    }

    #[test]
    fn share_sets_must_line_up() {
        let params = params(2, 3);
        let mut rng = test_rng();
        let shares_a = share(&BigUint::one(), &params, &mut rng).unwrap();
        let mut shares_b = share(&BigUint::one(), &params, &mut rng).unwrap();

        assert!(matches!(
            add_shares(&shares_a, &shares_b[..2], &params),
            Err(Error::ShareSetMismatch(_))
        ));

        shares_b[2].index = 7;
        assert!(matches!(
            add_shares(&shares_a, &shares_b, &params),
            Err(Error::ShareSetMismatch(_))
        ));
    }

    #[test]
    fn scalar_operations() {
        let params = params(2, 3);
        let mut rng = test_rng();
        let shares = share(&BigUint::from(40u32), &params, &mut rng).unwrap();

        let shifted = add_scalar(&shares, &BigUint::from(2u32), &params).unwrap();
        assert_eq!(
            reconstruct(&shifted[..2], &params).unwrap(),
            BigUint::from(42u32)
        );

        let scaled = mul_scalar(&shares, &BigUint::from(3u32), &params).unwrap();
        assert_eq!(
            reconstruct(&scaled[..2], &params).unwrap(),
            BigUint::from(120u32)
        );
    }

    /// A `t - 1` subset is consistent with *any* secret: given one share of
    /// a 2-out-of-3 sharing, exhibit a full sharing of a different secret
    /// that agrees on that share. The subset therefore cannot determine
    /// which secret was dealt.
    #[test]
    fn undersized_subset_determines_nothing() {
        let params = params(2, 3);
        let mut rng = test_rng();
        let p = field();

        let real_secret = BigUint::from(1111u32);
        let real_shares = share(&real_secret, &params, &mut rng).unwrap();
        let observed = &real_shares[0]; // f(1), all an adversary holds

        // Line g with g(0) = fake_secret and g(1) = observed value.
        let fake_secret = BigUint::from(2222u32);
        let slope = sub_mod(&observed.value, &fake_secret, &p);
        let g = |x: u32| (&fake_secret + &slope * BigUint::from(x)) % &p;

        let fake_shares = vec![
            observed.clone(),
            Share {
                index: 2,
                value: g(2),
            },
        ];
        assert_eq!(reconstruct(&fake_shares, &params).unwrap(), fake_secret);
    }

    #[test]
    fn signed_encoding_round_trips() {
        let params = params(2, 3);
        let max = BigInt::from(params.max_signed());

        for v in [
            BigInt::zero(),
            BigInt::from(-1),
            BigInt::from(42),
            max.clone(),
            -max.clone(),
        ] {
            let encoded = params.encode_signed(&v).unwrap();
            assert!(encoded < params.modulus);
            assert_eq!(params.decode_signed(&encoded).unwrap(), v);
        }

        assert!(matches!(
            params.encode_signed(&(max + 1)),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            params.decode_signed(&params.modulus.clone()),
            Err(Error::InvalidParameter(_))
        ));
    }

    proptest! {
        #[test]
        fn round_trip_for_random_secrets(secret in 0u64..(1u64 << 61) - 1, seed: u64) {
            let params = params(2, 3);
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            let secret = BigUint::from(secret);
            let shares = share(&secret, &params, &mut rng).unwrap();
            prop_assert_eq!(reconstruct(&shares[1..], &params).unwrap(), secret);
        }
    }
}
