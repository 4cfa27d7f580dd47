//! The Paillier cryptosystem: additively homomorphic public-key encryption.
//!
//! Standard textbook construction with `g = n + 1`. Encryption is
//! probabilistic; the homomorphism is addition modulo `n`, so a sum of
//! plaintexts that exceeds `n` silently wraps. That wraparound is a
//! documented correctness boundary of the scheme, not a defect — callers
//! must pick a key large enough for their aggregate.

use num_bigint_dig::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use tracing::info;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::arith;
use crate::error::{Error, Result};

/// How many prime pairs key generation tries before giving up.
///
/// Each attempt fails only if the sampled primes collide or violate the
/// `gcd(pq, (p-1)(q-1)) = 1` condition, so in practice the first attempt
/// succeeds.
pub const KEYGEN_RETRY_BUDGET: usize = 32;

/// Public half of a Paillier key pair.
///
/// Shared freely; ciphertexts produced under this key are only meaningful
/// relative to its modulus `n`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaillierPublicKey {
    /// The modulus, a product of two secret primes of comparable bit length.
    pub n: BigUint,
    /// The generator, `n + 1` in this construction.
    pub g: BigUint,
}

impl PaillierPublicKey {
    /// Returns `n^2`, the ciphertext-space modulus.
    pub fn n_squared(&self) -> BigUint {
        &self.n * &self.n
    }

    /// Bit length of the modulus.
    pub fn bit_length(&self) -> usize {
        self.n.bits()
    }
}

/// Private half of a Paillier key pair. Never leaves the owning party;
/// the trapdoor values are wiped from memory on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PaillierPrivateKey {
    /// `lcm(p - 1, q - 1)`.
    lambda: BigUint,
    /// `L(g^lambda mod n^2)^(-1) mod n`.
    mu: BigUint,
    /// Copy of the public modulus, kept so decryption needs no extra input.
    n: BigUint,
}

/// An encrypted integer in `[0, n^2)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ciphertext {
    /// The ciphertext value.
    pub value: BigUint,
    /// The public modulus `n` this ciphertext was produced under.
    pub modulus: BigUint,
}

/// Generates a Paillier key pair with a modulus of roughly `bit_length` bits.
///
/// Samples two probable primes of `bit_length / 2` bits each and retries
/// until `gcd(pq, (p-1)(q-1)) = 1` holds, up to [`KEYGEN_RETRY_BUDGET`]
/// attempts.
///
/// # Errors
/// `InvalidParameter` if `bit_length` is odd or below 16 bits;
/// `KeyGeneration` if no suitable prime pair is found within the budget.
pub fn generate_key_pair<R: RngCore + CryptoRng>(
    bit_length: usize,
    rng: &mut R,
) -> Result<(PaillierPublicKey, PaillierPrivateKey)> {
    if bit_length < 16 || bit_length % 2 != 0 {
        return Err(Error::InvalidParameter(format!(
            "key bit length must be even and >= 16, got {bit_length}"
        )));
    }

    for attempt in 1..=KEYGEN_RETRY_BUDGET {
        let p = arith::gen_prime(rng, bit_length / 2)?;
        let q = arith::gen_prime(rng, bit_length / 2)?;
        if p == q {
            continue;
        }

        let n = &p * &q;
        let p_minus_1 = &p - 1u32;
        let q_minus_1 = &q - 1u32;
        if !n.gcd(&(&p_minus_1 * &q_minus_1)).is_one() {
            continue;
        }

        let lambda = arith::lcm(&p_minus_1, &q_minus_1);
        let g = &n + 1u32;
        let n_squared = &n * &n;

        let u = arith::modexp(&g, &lambda, &n_squared)?;
        let l = l_function(&u, &n)?;
        let mu = match arith::modinv(&l, &n) {
            Ok(mu) => mu,
            // A non-invertible L value means this prime pair is unusable.
            Err(Error::NoInverse) => continue,
            Err(e) => return Err(e),
        };

        info!(bits = n.bits(), attempt, "generated Paillier key pair");
        let public = PaillierPublicKey { n: n.clone(), g };
        let private = PaillierPrivateKey { lambda, mu, n };
        return Ok((public, private));
    }

    Err(Error::KeyGeneration(KEYGEN_RETRY_BUDGET))
}

/// Encrypts `plaintext` under `public_key`.
///
/// Probabilistic: a fresh `r` coprime to `n` is drawn per call, so two
/// encryptions of the same plaintext differ. The ciphertext is
/// `g^m * r^n mod n^2`.
///
/// # Errors
/// `InvalidParameter` if `plaintext >= n`.
pub fn encrypt<R: RngCore + CryptoRng>(
    public_key: &PaillierPublicKey,
    plaintext: &BigUint,
    rng: &mut R,
) -> Result<Ciphertext> {
    if plaintext >= &public_key.n {
        return Err(Error::InvalidParameter(
            "plaintext must be in [0, n)".into(),
        ));
    }

    let n_squared = public_key.n_squared();
    let r = arith::sample_coprime(rng, &public_key.n)?;
    let g_m = arith::modexp(&public_key.g, plaintext, &n_squared)?;
    let r_n = arith::modexp(&r, &public_key.n, &n_squared)?;

    Ok(Ciphertext {
        value: (g_m * r_n) % &n_squared,
        modulus: public_key.n.clone(),
    })
}

impl PaillierPrivateKey {
    /// Decrypts a ciphertext: `L(c^lambda mod n^2) * mu mod n`.
    ///
    /// # Errors
    /// `KeyMismatch` if the ciphertext was produced under a different
    /// modulus; `InvalidCiphertext` if the value is outside `[0, n^2)` or
    /// fails the `L`-function divisibility check (a malformed ciphertext).
    pub fn decrypt(&self, ciphertext: &Ciphertext) -> Result<BigUint> {
        if ciphertext.modulus != self.n {
            return Err(Error::KeyMismatch);
        }
        let n_squared = &self.n * &self.n;
        if ciphertext.value >= n_squared {
            return Err(Error::InvalidCiphertext);
        }

        let u = arith::modexp(&ciphertext.value, &self.lambda, &n_squared)?;
        let l = l_function(&u, &self.n)?;
        Ok((l * &self.mu) % &self.n)
    }

    /// The public modulus this key decrypts under.
    pub fn modulus(&self) -> &BigUint {
        &self.n
    }
}

/// Homomorphic addition: decrypting the result yields `(m_a + m_b) mod n`.
///
/// # Errors
/// `KeyMismatch` if the operands or the key disagree on the modulus;
/// `InvalidCiphertext` if an operand is outside `[0, n^2)`.
pub fn add(
    a: &Ciphertext,
    b: &Ciphertext,
    public_key: &PaillierPublicKey,
) -> Result<Ciphertext> {
    if a.modulus != public_key.n || b.modulus != public_key.n {
        return Err(Error::KeyMismatch);
    }
    let n_squared = public_key.n_squared();
    if a.value >= n_squared || b.value >= n_squared {
        return Err(Error::InvalidCiphertext);
    }

    Ok(Ciphertext {
        value: (&a.value * &b.value) % &n_squared,
        modulus: public_key.n.clone(),
    })
}

/// Adds a known plaintext scalar to a ciphertext: `c * g^scalar mod n^2`.
///
/// # Errors
/// `KeyMismatch` if the ciphertext belongs to a different modulus;
/// `InvalidParameter` if `scalar >= n`.
pub fn add_plain(
    ciphertext: &Ciphertext,
    scalar: &BigUint,
    public_key: &PaillierPublicKey,
) -> Result<Ciphertext> {
    if ciphertext.modulus != public_key.n {
        return Err(Error::KeyMismatch);
    }
    if scalar >= &public_key.n {
        return Err(Error::InvalidParameter("scalar must be in [0, n)".into()));
    }
    let n_squared = public_key.n_squared();

    Ok(Ciphertext {
        value: (&ciphertext.value * arith::modexp(&public_key.g, scalar, &n_squared)?) % &n_squared,
        modulus: public_key.n.clone(),
    })
}

/// Multiplies the encrypted value by a known plaintext scalar: `c^scalar
/// mod n^2`. Decrypting the result yields `m * scalar mod n`.
///
/// # Errors
/// `KeyMismatch` if the ciphertext belongs to a different modulus.
pub fn mul_plain(
    ciphertext: &Ciphertext,
    scalar: &BigUint,
    public_key: &PaillierPublicKey,
) -> Result<Ciphertext> {
    if ciphertext.modulus != public_key.n {
        return Err(Error::KeyMismatch);
    }
    let n_squared = public_key.n_squared();

    Ok(Ciphertext {
        value: arith::modexp(&ciphertext.value, scalar, &n_squared)?,
        modulus: public_key.n.clone(),
    })
}

/// `L(x) = (x - 1) / n`, defined only when `x = 1 (mod n)`.
fn l_function(x: &BigUint, n: &BigUint) -> Result<BigUint> {
    if x.is_zero() {
        return Err(Error::InvalidCiphertext);
    }
    let x_minus_1 = x - 1u32;
    if !(&x_minus_1 % n).is_zero() {
        return Err(Error::InvalidCiphertext);
    }
    Ok(x_minus_1 / n)
}
