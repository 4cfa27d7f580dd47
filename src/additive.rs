//! Additive n-of-n secret sharing over a prime field.
//!
//! The secret is split so that the shares sum to it modulo `p`: all `N`
//! shares are required for reconstruction, and even `N - 1` shares reveal
//! nothing, since every value of the missing share corresponds to a
//! different secret. Like the threshold scheme, the sharing is linear, so
//! share sets may be summed pointwise before the single final
//! reconstruction.

use std::collections::HashSet;

use num_bigint_dig::{prime::probably_prime, BigUint};
use num_traits::Zero;
use rand::{CryptoRng, RngCore};

use crate::arith;
use crate::error::{Error, Result};
use crate::shamir::Share;

/// Miller-Rabin rounds used when validating the field modulus.
const PRIMALITY_ROUNDS: usize = 20;

/// Configuration of one additive sharing instance. There is no threshold:
/// reconstruction always needs every share.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdditiveParameters {
    /// The prime field modulus.
    pub modulus: BigUint,
    /// Total number of shares dealt, all of which are needed.
    pub parties: u32,
}

impl AdditiveParameters {
    /// Validates and constructs additive sharing parameters.
    ///
    /// # Errors
    /// `InvalidParameter` if there are no parties or the modulus is not a
    /// probable prime.
    pub fn new(modulus: BigUint, parties: u32) -> Result<Self> {
        if parties == 0 {
            return Err(Error::InvalidParameter(
                "at least one party is required".into(),
            ));
        }
        if !probably_prime(&modulus, PRIMALITY_ROUNDS) {
            return Err(Error::InvalidParameter("modulus must be prime".into()));
        }
        Ok(AdditiveParameters { modulus, parties })
    }
}

/// Splits `secret` into `N` shares summing to it modulo `p`.
///
/// All shares but the first are uniformly random; the first absorbs the
/// difference so the sum comes out right.
///
/// # Errors
/// `InvalidParameter` if `secret >= p`.
pub fn share<R: RngCore + CryptoRng>(
    secret: &BigUint,
    params: &AdditiveParameters,
    rng: &mut R,
) -> Result<Vec<Share>> {
    if secret >= &params.modulus {
        return Err(Error::InvalidParameter(
            "secret must be in [0, p)".into(),
        ));
    }

    let p = &params.modulus;
    let mut shares = Vec::with_capacity(params.parties as usize);
    let mut running_sum = BigUint::zero();
    for index in 2..=params.parties {
        let value = arith::sample_below(rng, p)?;
        running_sum = (running_sum + &value) % p;
        shares.push(Share { index, value });
    }
    // (secret - sum of the random shares) mod p.
    let corrective = (p + secret - running_sum) % p;
    shares.insert(
        0,
        Share {
            index: 1,
            value: corrective,
        },
    );
    Ok(shares)
}

/// Reconstructs the secret as the sum of all `N` shares modulo `p`.
///
/// # Errors
/// `DuplicateShareIndex` if an index repeats, `InsufficientShares` unless
/// exactly the full share set is present, and `InvalidParameter` for a
/// y-value outside the field.
pub fn reconstruct(shares: &[Share], params: &AdditiveParameters) -> Result<BigUint> {
    let mut seen = HashSet::new();
    for s in shares {
        if !seen.insert(s.index) {
            return Err(Error::DuplicateShareIndex(s.index));
        }
        if s.value >= params.modulus {
            return Err(Error::InvalidParameter(format!(
                "share value at index {} is not a field element",
                s.index
            )));
        }
    }
    if shares.len() < params.parties as usize {
        return Err(Error::InsufficientShares {
            provided: shares.len(),
            required: params.parties as usize,
        });
    }

    let mut sum = BigUint::zero();
    for s in shares {
        sum = (sum + &s.value) % &params.modulus;
    }
    Ok(sum)
}

/// Pointwise sum of two additive share sets, matched by index: shares of
/// `a` plus shares of `b` are shares of `(a + b) mod p`.
///
/// # Errors
/// `ShareSetMismatch` if the index sets differ.
pub fn add_shares(a: &[Share], b: &[Share], params: &AdditiveParameters) -> Result<Vec<Share>> {
    if a.len() != b.len() {
        return Err(Error::ShareSetMismatch(format!(
            "left has {} shares, right has {}",
            a.len(),
            b.len()
        )));
    }

    let mut out = Vec::with_capacity(a.len());
    for sa in a {
        let sb = b.iter().find(|s| s.index == sa.index).ok_or_else(|| {
            Error::ShareSetMismatch(format!("index {} missing from right-hand set", sa.index))
        })?;
        out.push(Share {
            index: sa.index,
            value: (&sa.value + &sb.value) % &params.modulus,
        });
    }
    Ok(out)
}
