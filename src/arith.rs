//! Modular big-integer arithmetic shared by both cryptosystems.
//!
//! Everything here operates on arbitrary-precision integers: Paillier moduli
//! routinely exceed 2048 bits and their squares exceed 4096 bits, so no
//! operation may assume machine-word bounds. Randomness is always an injected
//! generator, never ambient state, so callers can supply a seeded source for
//! reproducible tests.

use num_bigint_dig::traits::ModInverse;
use num_bigint_dig::{BigUint, RandBigInt, RandPrime};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};

use crate::error::{Error, Result};

/// Computes `base^exponent mod modulus`.
///
/// # Errors
/// Returns `InvalidParameter` if the modulus is zero.
pub fn modexp(base: &BigUint, exponent: &BigUint, modulus: &BigUint) -> Result<BigUint> {
    if modulus.is_zero() {
        return Err(Error::InvalidParameter("modexp with zero modulus".into()));
    }
    Ok(base.modpow(exponent, modulus))
}

/// Computes the multiplicative inverse of `a` modulo `modulus`.
///
/// # Errors
/// Returns `NoInverse` if `gcd(a, modulus) != 1`.
pub fn modinv(a: &BigUint, modulus: &BigUint) -> Result<BigUint> {
    if modulus.is_zero() {
        return Err(Error::InvalidParameter("modinv with zero modulus".into()));
    }
    a.mod_inverse(modulus)
        .and_then(|inv| inv.to_biguint())
        .ok_or(Error::NoInverse)
}

/// Computes the least common multiple of `a` and `b`.
pub fn lcm(a: &BigUint, b: &BigUint) -> BigUint {
    a.lcm(b)
}

/// Samples a uniform integer in `[0, bound)`.
///
/// # Errors
/// Returns `InvalidParameter` if `bound` is zero.
pub fn sample_below<R: RngCore + CryptoRng>(rng: &mut R, bound: &BigUint) -> Result<BigUint> {
    if bound.is_zero() {
        return Err(Error::InvalidParameter("sample bound must be > 0".into()));
    }
    Ok(rng.gen_biguint_below(bound))
}

/// Samples a uniform integer in `[low, high)`.
///
/// # Errors
/// Returns `InvalidParameter` if the range is empty.
pub fn sample_range<R: RngCore + CryptoRng>(
    rng: &mut R,
    low: &BigUint,
    high: &BigUint,
) -> Result<BigUint> {
    if low >= high {
        return Err(Error::InvalidParameter(format!(
            "empty sampling range [{low}, {high})"
        )));
    }
    Ok(rng.gen_biguint_range(low, high))
}

/// Samples a uniform integer in `[1, modulus)` that is coprime to `modulus`.
///
/// Used for Paillier encryption randomness. For an RSA-style modulus the
/// rejection probability is negligible, so the loop terminates almost
/// always on the first draw.
///
/// # Errors
/// Returns `InvalidParameter` if `modulus <= 1`.
pub fn sample_coprime<R: RngCore + CryptoRng>(rng: &mut R, modulus: &BigUint) -> Result<BigUint> {
    if *modulus <= BigUint::one() {
        return Err(Error::InvalidParameter(
            "coprime sampling requires modulus > 1".into(),
        ));
    }
    loop {
        let candidate = rng.gen_biguint_range(&BigUint::one(), modulus);
        if candidate.gcd(modulus).is_one() {
            return Ok(candidate);
        }
    }
}

/// Generates a probable prime of exactly `bit_length` bits.
///
/// # Errors
/// Returns `InvalidParameter` if `bit_length < 8`.
pub fn gen_prime<R: RngCore + CryptoRng>(rng: &mut R, bit_length: usize) -> Result<BigUint> {
    if bit_length < 8 {
        return Err(Error::InvalidParameter(format!(
            "prime bit length {bit_length} is too small"
        )));
    }
    Ok(rng.gen_prime(bit_length))
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint_dig::prime::probably_prime;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn test_rng() -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(0x6d70_6331)
    }

    #[test]
    fn modexp_matches_known_values() {
        let base = BigUint::from(4u32);
        let exp = BigUint::from(13u32);
        let m = BigUint::from(497u32);
        assert_eq!(modexp(&base, &exp, &m).unwrap(), BigUint::from(445u32));

        // Fermat: a^(p-1) = 1 mod p for prime p not dividing a.
        let p = BigUint::from(65_537u32);
        let a = BigUint::from(12_345u32);
        let e = &p - 1u32;
        assert_eq!(modexp(&a, &e, &p).unwrap(), BigUint::one());
    }

    #[test]
    fn modexp_beyond_word_size() {
        // 2^256 mod (2^255 - 19) = 38, exercised without native overflow.
        let base = BigUint::from(2u32);
        let exp = BigUint::from(256u32);
        let m = (BigUint::one() << 255) - BigUint::from(19u32);
        assert_eq!(modexp(&base, &exp, &m).unwrap(), BigUint::from(38u32));
    }

    #[test]
    fn modexp_rejects_zero_modulus() {
        let r = modexp(&BigUint::one(), &BigUint::one(), &BigUint::zero());
        assert!(matches!(r, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn modinv_round_trips() {
        let m = BigUint::from(65_537u32);
        let a = BigUint::from(1234u32);
        let inv = modinv(&a, &m).unwrap();
        assert_eq!((a * inv) % m, BigUint::one());
    }

    #[test]
    fn modinv_fails_when_not_coprime() {
        let r = modinv(&BigUint::from(6u32), &BigUint::from(9u32));
        assert!(matches!(r, Err(Error::NoInverse)));
    }

    #[test]
    fn lcm_of_even_neighbours() {
        assert_eq!(
            lcm(&BigUint::from(12u32), &BigUint::from(18u32)),
            BigUint::from(36u32)
        );
    }

    #[test]
    fn sampling_respects_bounds() {
        let mut rng = test_rng();
        let bound = BigUint::from(1000u32);
        for _ in 0..100 {
            assert!(sample_below(&mut rng, &bound).unwrap() < bound);
        }
        let low = BigUint::from(500u32);
        for _ in 0..100 {
            let v = sample_range(&mut rng, &low, &bound).unwrap();
            assert!(v >= low && v < bound);
        }
        assert!(matches!(
            sample_below(&mut rng, &BigUint::zero()),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            sample_range(&mut rng, &bound, &low),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn coprime_samples_are_coprime() {
        let mut rng = test_rng();
        // 2^5 * 3^3 * 5 * 7: plenty of non-coprime residues to reject.
        let m = BigUint::from(30_240u32);
        for _ in 0..50 {
            let r = sample_coprime(&mut rng, &m).unwrap();
            assert!(r.gcd(&m).is_one());
            assert!(r >= BigUint::one() && r < m);
        }
    }

    #[test]
    fn generated_primes_have_requested_size() {
        let mut rng = test_rng();
        let p = gen_prime(&mut rng, 128).unwrap();
        assert_eq!(p.bits(), 128);
        assert!(probably_prime(&p, 20));
    }
}
