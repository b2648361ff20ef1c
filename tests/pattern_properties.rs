//! 访问模式的性质测试

use ftl_bench::config::BenchmarkConfig;
use ftl_bench::pattern::{PatternGenerator, Strategy};
use ftl_bench::size::{ByteSize, parse_size};
use ftl_bench::testset::{parse_test_set, render_test_set};
use proptest::prelude::*;

fn generator(instances: u64, block: u64, seed: u64) -> PatternGenerator {
    let config = BenchmarkConfig {
        instance_count: instances,
        block_size: ByteSize::new(block),
        ..BenchmarkConfig::default()
    };
    PatternGenerator::new(&config, seed).unwrap()
}

fn sorted(mut v: Vec<u64>) -> Vec<u64> {
    v.sort_unstable();
    v
}

#[test]
fn reference_setup_counts() {
    let config = BenchmarkConfig::default();
    let cnt = config.per_instance_count().unwrap();
    assert_eq!(cnt, 8192);

    let seq = PatternGenerator::new(&config, 0)
        .unwrap()
        .generate(Strategy::Linear, cnt)
        .unwrap();
    assert_eq!(seq.len(), 32768);
    assert_eq!(seq.iter().max(), Some(&32767));
}

#[test]
fn size_parser_examples() {
    assert_eq!(parse_size("4G").unwrap(), 4_294_967_296);
    assert_eq!(parse_size("128K").unwrap(), 131_072);
    assert_eq!(parse_size("16").unwrap(), 16);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_linear_is_strictly_increasing(instances in 1u64..8, cnt in 0u64..500) {
        let seq = generator(instances, 4096, 0).linear(cnt).unwrap();
        prop_assert_eq!(seq.len() as u64, cnt * instances);
        for (i, addr) in seq.iter().enumerate() {
            prop_assert_eq!(*addr, i as u64);
        }
    }

    #[test]
    fn prop_random_is_reproducible_permutation(
        instances in 1u64..8,
        cnt in 0u64..500,
        seed in any::<u64>(),
    ) {
        let g = generator(instances, 4096, seed);
        let a = g.random(cnt).unwrap();
        prop_assert_eq!(&a, &g.random(cnt).unwrap());
        prop_assert_eq!(sorted(a), g.linear(cnt).unwrap());
    }

    #[test]
    fn prop_round_robin_has_no_duplicates(
        instances in 1u64..8,
        // 32K 页下 bpp 为 1..=8
        block_kib in prop::sample::select(vec![4u64, 8, 16, 32]),
        cnt in 0u64..300,
        seed in any::<u64>(),
    ) {
        let g = generator(instances, block_kib * 1024, seed);
        let bpp = 32 / block_kib;
        let seq = g.round_robin(cnt).unwrap();
        prop_assert_eq!(seq.len() as u64, cnt * instances);

        let unique = sorted(seq.clone());
        prop_assert!(unique.windows(2).all(|w| w[0] < w[1]));

        // 第 k 个地址属于实例 k % instances
        let gap = bpp * instances;
        for (k, addr) in seq.iter().enumerate() {
            prop_assert_eq!((addr % gap) / bpp, k as u64 % instances);
        }
    }

    #[test]
    fn prop_per_page_matches_round_robin_set(
        instances in 1u64..6,
        block_kib in prop::sample::select(vec![4u64, 8, 16, 32]),
        cnt in 0u64..300,
        seed in any::<u64>(),
    ) {
        let g = generator(instances, block_kib * 1024, seed);
        let per_page = g.round_robin_per_page(cnt).unwrap();
        let per_block = g.round_robin(cnt).unwrap();
        prop_assert_eq!(sorted(per_page), sorted(per_block));
    }

    #[test]
    fn prop_test_set_text_round_trips(seq in prop::collection::vec(any::<u64>(), 0..200)) {
        prop_assert_eq!(parse_test_set(&render_test_set(&seq)).unwrap(), seq);
    }
}
