//! MPC toolkit
//!
//! A small secure multi-party computation toolkit for honest-but-curious
//! parties:
//!
//! - **Paillier encryption** ([`paillier`]): a partially homomorphic
//!   public-key cryptosystem — anyone holding the public key can add
//!   ciphertexts (and known plaintexts) without learning what they encrypt.
//! - **Shamir secret sharing** ([`shamir`]): `t`-out-of-`N` threshold
//!   sharing over a prime field, with pointwise share addition so parties
//!   can jointly sum secrets and reconstruct only the total.
//! - **Additive secret sharing** ([`additive`]): the `N`-of-`N` variant.
//! - **Channels** ([`channel`]): ordered, reliable, exactly-once message
//!   pipes between named parties, carrying the cryptographic artifacts in
//!   a canonical wire format.
//!
//! The big-integer layer ([`arith`]) keeps all of it exact at any key
//! size. Randomness is always injected by the caller, so tests can run on
//! a seeded generator while production uses an OS-backed one.
//!
//! Parties are isolated: each owns its private key and raw secrets, and
//! only ciphertexts and shares ever cross a channel. The toolkit assumes
//! honest-but-curious participants and leaves transport authentication to
//! an outer layer.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mpc_toolkit::{paillier, shamir};
//! use num_bigint_dig::BigUint;
//!
//! let mut rng = rand::thread_rng();
//!
//! // Paillier: add under encryption.
//! let (pk, sk) = paillier::generate_key_pair(2048, &mut rng)?;
//! let c1 = paillier::encrypt(&pk, &BigUint::from(7u32), &mut rng)?;
//! let c2 = paillier::encrypt(&pk, &BigUint::from(5u32), &mut rng)?;
//! let sum = paillier::add(&c1, &c2, &pk)?;
//! assert_eq!(sk.decrypt(&sum)?, BigUint::from(12u32));
//!
//! // Shamir: any 2 of 3 shares reconstruct.
//! let field = (BigUint::from(1u32) << 61) - 1u32;
//! let params = shamir::SharingParameters::new(field, 2, 3)?;
//! let shares = shamir::share(&BigUint::from(42u32), &params, &mut rng)?;
//! assert_eq!(shamir::reconstruct(&shares[..2], &params)?, BigUint::from(42u32));
//! # Ok::<(), mpc_toolkit::Error>(())
//! ```

pub mod additive;
pub mod arith;
pub mod channel;
pub mod error;
pub mod paillier;
pub mod shamir;

pub use channel::{Channel, ChannelState, PartyId, WireMessage};
pub use error::{Error, Result};
