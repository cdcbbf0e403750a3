use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use markov_gen_core::model::combine::combine;
use markov_gen_core::model::{ChainData, SentenceGenerator, SparseChain};
use markov_gen_core::text::WhitespaceSplitter;

const WORDS: [&str; 8] = ["the", "cat", "sat", "on", "a", "mat", "and", "purred"];

fn sentence() -> impl Strategy<Value = String> {
	prop::collection::vec(prop::sample::select(WORDS.to_vec()), 1..8).prop_map(|words| words.join(" "))
}

fn corpus() -> impl Strategy<Value = Vec<String>> {
	prop::collection::vec(sentence(), 1..12)
}

fn sparse(sentences: &[String], state_size: usize) -> ChainData {
	ChainData::Sparse(SparseChain::build(sentences, state_size, &WhitespaceSplitter).unwrap())
}

proptest! {
	#[test]
	fn unit_weights_equal_no_weights(first in corpus(), second in corpus(), state_size in 1usize..4) {
		let a = sparse(&first, state_size);
		let b = sparse(&second, state_size);
		let weighted = combine(&[&a, &b], Some(&[1.0, 1.0][..])).unwrap();
		let unweighted = combine(&[&a, &b], None).unwrap();
		prop_assert_eq!(weighted, unweighted);
	}

	#[test]
	fn parallel_build_equals_sequential(sentences in prop::collection::vec(sentence(), 2..64)) {
		let sequential = SparseChain::build(&sentences, 2, &WhitespaceSplitter).unwrap();
		let parallel = SparseChain::build_parallel(&sentences, 2, &WhitespaceSplitter, 2).unwrap();
		prop_assert_eq!(parallel, sequential);
	}

	#[test]
	fn compiled_totals_match_sparse(sentences in corpus(), state_size in 1usize..4) {
		let chain = SparseChain::build(&sentences, state_size, &WhitespaceSplitter).unwrap();
		let compiled = chain.compile();
		prop_assert_eq!(compiled.len(), chain.len());
		for (state, transitions) in chain.iter() {
			prop_assert_eq!(compiled.total_weight(state), transitions.total());
		}
	}

	#[test]
	fn short_sentences_stay_under_the_limit(
		sentences in corpus(),
		max_chars in 1usize..40,
		attempts in 1usize..20,
		seed in any::<u64>(),
	) {
		let compiled = SparseChain::build(&sentences, 2, &WhitespaceSplitter).unwrap().compile();
		let generator = SentenceGenerator::new(&compiled, &WhitespaceSplitter);
		let mut rng = StdRng::seed_from_u64(seed);
		if let Some(sentence) = generator.make_short_sentence_with(&mut rng, max_chars, attempts) {
			prop_assert!(sentence.chars().count() < max_chars);
			prop_assert!(!sentence.trim().is_empty());
		}
	}

	#[test]
	fn seeded_generation_is_reproducible(sentences in corpus(), seed in any::<u64>()) {
		let compiled = SparseChain::build(&sentences, 2, &WhitespaceSplitter).unwrap().compile();
		let generator = SentenceGenerator::new(&compiled, &WhitespaceSplitter);
		let first = generator.make_sentence_with(&mut StdRng::seed_from_u64(seed), 5);
		let second = generator.make_sentence_with(&mut StdRng::seed_from_u64(seed), 5);
		prop_assert_eq!(first, second);
	}
}
