use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use mpc_toolkit::paillier;
use num_bigint_dig::BigUint;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn bench_keygen(c: &mut Criterion) {
    let mut rng = ChaCha20Rng::seed_from_u64(1);
    let mut group = c.benchmark_group("paillier_keygen");
    group.sample_size(10);

    for bits in [256usize, 512] {
        group.bench_with_input(BenchmarkId::from_parameter(bits), &bits, |b, &bits| {
            b.iter(|| paillier::generate_key_pair(bits, &mut rng).unwrap())
        });
    }
    group.finish();
}

fn bench_encrypt_decrypt(c: &mut Criterion) {
    let mut rng = ChaCha20Rng::seed_from_u64(2);

    let mut group = c.benchmark_group("paillier_encrypt");
    for bits in [512usize, 1024] {
        let (pk, _) = paillier::generate_key_pair(bits, &mut rng).unwrap();
        let m = BigUint::from(123_456u32);
        group.bench_with_input(BenchmarkId::from_parameter(bits), &bits, |b, _| {
            b.iter(|| paillier::encrypt(&pk, &m, &mut rng).unwrap())
        });
    }
    group.finish();

    let mut group = c.benchmark_group("paillier_decrypt");
    for bits in [512usize, 1024] {
        let (pk, sk) = paillier::generate_key_pair(bits, &mut rng).unwrap();
        let ct = paillier::encrypt(&pk, &BigUint::from(123_456u32), &mut rng).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(bits), &bits, |b, _| {
            b.iter(|| sk.decrypt(&ct).unwrap())
        });
    }
    group.finish();
}

fn bench_homomorphic_add(c: &mut Criterion) {
    let mut rng = ChaCha20Rng::seed_from_u64(3);
    let mut group = c.benchmark_group("paillier_add");

    for bits in [512usize, 1024] {
        let (pk, _) = paillier::generate_key_pair(bits, &mut rng).unwrap();
        let c1 = paillier::encrypt(&pk, &BigUint::from(7u32), &mut rng).unwrap();
        let c2 = paillier::encrypt(&pk, &BigUint::from(5u32), &mut rng).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(bits), &bits, |b, _| {
            b.iter(|| paillier::add(&c1, &c2, &pk).unwrap())
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_keygen,
    bench_encrypt_decrypt,
    bench_homomorphic_add
);
criterion_main!(benches);
