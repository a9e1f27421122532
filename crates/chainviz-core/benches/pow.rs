use chainviz_core::{mine::mine_parallel, Block, Chain, Difficulty, MiningControl};
use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn bench_pow(c: &mut Criterion) {
    let difficulty = Difficulty::new(3).expect("difficulty");
    let mut rng = StdRng::seed_from_u64(42);
    let template = Block::new(
        1,
        1_700_000_000_000,
        format!("alice pays bob {}", rng.gen_range(1..100)),
        Block::genesis().hash(),
    );

    c.bench_function("mine_block_difficulty_3", |b| {
        b.iter(|| {
            let mut block = template.clone();
            block.mine(difficulty);
            block
        });
    });

    c.bench_function("mine_parallel_difficulty_3", |b| {
        b.iter(|| mine_parallel(&template, difficulty, &MiningControl::new()));
    });

    let mut chain = Chain::new(Difficulty::new(1).expect("difficulty"));
    for i in 0..256 {
        chain.append_block_at(format!("tx {i}"), 1_700_000_000_000 + i);
    }
    c.bench_function("validate_chain_257_blocks", |b| b.iter(|| chain.is_valid()));
}

criterion_group!(benches, bench_pow);
criterion_main!(benches);
