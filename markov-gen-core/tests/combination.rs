mod common;

use common::{SAMPLE_CORPUS, compiled, fixture, raw, stored_ids, uncompiled};
use markov_gen_core::config::MarkovConfig;
use markov_gen_core::error::{CombineError, MarkovError, ValidationError};
use markov_gen_core::events::SentenceStats;
use markov_gen_core::model::{BuildOptions, CombineMode, Combined, Engine, MarkovModel, ReturnType, State};

struct Pool {
	clean: Vec<MarkovModel>,
	empty: Vec<MarkovModel>,
	compiled: Vec<MarkovModel>,
}

impl Pool {
	fn new(engine: &Engine) -> Self {
		let entries = [
			SAMPLE_CORPUS,
			"My name is Inigo Montoya. You killed my father. Prepare to die.",
			"I like springtime. Does this bring joy?",
		];
		Self {
			clean: entries.into_iter().map(|entry| uncompiled(engine, &[entry])).collect(),
			empty: (0..2).map(|_| engine.create_model().unwrap()).collect(),
			compiled: entries.into_iter().map(|entry| compiled(engine, &[entry])).collect(),
		}
	}

	fn all(&self) -> Vec<&MarkovModel> {
		self.clean.iter().chain(&self.empty).chain(&self.compiled).collect()
	}
}

#[test]
fn permissive_merges_only_workable_models() {
	let fx = fixture(MarkovConfig::default());
	let pool = Pool::new(&fx.engine);
	let models = pool.all();
	assert_eq!(stored_ids(fx.store.as_ref()), 8);

	let outcome = fx.engine.combine_models(&models, CombineMode::Permissive, ReturnType::Transient, None).unwrap();
	assert_eq!(outcome.merged, 3);
	assert!(matches!(outcome.result, Combined::Chain(ref chain) if !chain.is_empty()));
	assert_eq!(stored_ids(fx.store.as_ref()), 8);

	let outcome = fx.engine.combine_models(&models, CombineMode::Permissive, ReturnType::Persisted, None).unwrap();
	assert_eq!(outcome.merged, 3);
	let Combined::Model(mut merged) = outcome.result else {
		panic!("expected a stored model");
	};
	assert_eq!(stored_ids(fx.store.as_ref()), 9);
	assert!(merged.is_ready());
	assert!(!merged.is_compiled().unwrap());

	merged.refresh().unwrap();
	assert!(merged.is_ready());
	assert!(merged.generate_sentence(0, Some(50)).unwrap().is_some());
}

#[test]
fn strict_fails_on_the_same_pool() {
	let fx = fixture(MarkovConfig::default());
	let pool = Pool::new(&fx.engine);
	let models = pool.all();
	let before: Vec<String> = models.iter().map(|model| raw(&fx.store, model)).collect();

	let err = fx.engine.combine_models(&models, CombineMode::Strict, ReturnType::Persisted, None).unwrap_err();
	match err.as_combine() {
		Some(CombineError::Rejected(report)) => {
			assert_eq!(report.candidates, 8);
			assert_eq!(report.not_ready, 2);
			assert_eq!(report.compiled, 3);
			assert_eq!(report.accepted(), 3);
		}
		other => panic!("unexpected error: {other:?}"),
	}

	assert_eq!(stored_ids(fx.store.as_ref()), 8);
	let after: Vec<String> = models.iter().map(|model| raw(&fx.store, model)).collect();
	assert_eq!(before, after);
}

#[test]
fn strict_state_size_mismatch_leaves_inputs_unchanged() {
	let fx = fixture(MarkovConfig::default());
	let small = uncompiled(&fx.engine, &[SAMPLE_CORPUS]);
	let mut large = fx.engine.create_model().unwrap();
	large
		.build(&[SAMPLE_CORPUS], BuildOptions { state_size: Some(3), ..BuildOptions::default() })
		.unwrap();
	let before = (raw(&fx.store, &small), raw(&fx.store, &large));

	let err = fx
		.engine
		.combine_models(&[&small, &large], CombineMode::Strict, ReturnType::Persisted, None)
		.unwrap_err();
	assert!(err.as_combine().unwrap().is_incompatible_state());
	assert_eq!((raw(&fx.store, &small), raw(&fx.store, &large)), before);
	assert_eq!(stored_ids(fx.store.as_ref()), 2);
}

#[test]
fn permissive_drops_mismatched_state_size() {
	let fx = fixture(MarkovConfig::default());
	let first = uncompiled(&fx.engine, &[SAMPLE_CORPUS]);
	let second = uncompiled(&fx.engine, &["My name is Inigo Montoya."]);
	let mut third = fx.engine.create_model().unwrap();
	third
		.build(&["You killed my father."], BuildOptions { state_size: Some(3), ..BuildOptions::default() })
		.unwrap();

	let outcome = fx
		.engine
		.combine_models(&[&first, &second, &third], CombineMode::Permissive, ReturnType::Transient, None)
		.unwrap();
	assert_eq!(outcome.merged, 2);
	let Combined::Chain(chain) = outcome.result else {
		panic!("expected a chain");
	};
	assert_eq!(chain.state_size(), 2);
}

#[test]
fn unit_weights_match_no_weights() {
	let fx = fixture(MarkovConfig::default());
	let first = uncompiled(&fx.engine, &[SAMPLE_CORPUS]);
	let second = uncompiled(&fx.engine, &["My name is Inigo Montoya. You killed my father."]);
	let models = [&first, &second];

	let transient = |weights: Option<&[f64]>| {
		match fx.engine.combine_models(&models, CombineMode::Strict, ReturnType::Transient, weights).unwrap().result {
			Combined::Chain(chain) => chain,
			Combined::Model(_) => panic!("expected a chain"),
		}
	};
	let unweighted = transient(None);
	assert_eq!(transient(Some(&[1.0, 1.0][..])), unweighted);

	let weighted = transient(Some(&[1.0, 3.0][..]));
	assert_ne!(weighted, unweighted);
	let begin = State::initial(2);
	let old = first.chain().unwrap().as_sparse().unwrap().transitions(&begin).unwrap().total();
	assert_eq!(weighted.transitions(&begin).unwrap().total(), old + 2.0 * 3.0);
}

#[test]
fn weights_usage_errors() {
	let fx = fixture(MarkovConfig::default());
	let first = uncompiled(&fx.engine, &[SAMPLE_CORPUS]);
	let second = uncompiled(&fx.engine, &["My name is Inigo Montoya."]);
	let models = [&first, &second];

	let err = fx
		.engine
		.combine_models(&models, CombineMode::Permissive, ReturnType::Transient, Some(&[1.0, 1.0][..]))
		.unwrap_err();
	assert!(matches!(err, MarkovError::Validation(ValidationError::WeightsInPermissiveMode)));

	let err = fx
		.engine
		.combine_models(&models, CombineMode::Strict, ReturnType::Transient, Some(&[1.0][..]))
		.unwrap_err();
	assert!(matches!(err, MarkovError::Validation(ValidationError::WeightsLength { expected: 2, found: 1 })));

	let err = fx
		.engine
		.combine_models(&models, CombineMode::Strict, ReturnType::Transient, Some(&[1.0, -2.0][..]))
		.unwrap_err();
	assert!(matches!(err, MarkovError::Validation(ValidationError::InvalidWeight(_))));
}

#[test]
fn single_workable_model_is_not_enough() {
	let fx = fixture(MarkovConfig::default());
	let clean = uncompiled(&fx.engine, &[SAMPLE_CORPUS]);
	let empty = fx.engine.create_model().unwrap();

	let err = fx
		.engine
		.combine_models(&[&clean, &empty], CombineMode::Permissive, ReturnType::Persisted, None)
		.unwrap_err();
	assert!(matches!(err.as_combine(), Some(CombineError::NotEnoughChains { found: 1 })));
	assert_eq!(stored_ids(fx.store.as_ref()), 2);
}

#[test]
fn mode_and_return_type_parsing() {
	assert_eq!("strict".parse::<CombineMode>().unwrap(), CombineMode::Strict);
	assert_eq!("permissive".parse::<CombineMode>().unwrap(), CombineMode::Permissive);
	assert!(matches!("lenient".parse::<CombineMode>(), Err(ValidationError::UnknownMode(mode)) if mode == "lenient"));

	assert_eq!("persisted".parse::<ReturnType>().unwrap(), ReturnType::Persisted);
	assert_eq!("transient".parse::<ReturnType>().unwrap(), ReturnType::Transient);
	assert!(matches!("model".parse::<ReturnType>(), Err(ValidationError::UnknownReturnType(_))));
}

#[test]
fn summary_counts_ready_models_and_sentences() {
	let fx = fixture(MarkovConfig::default());
	let pool = Pool::new(&fx.engine);
	for model in &pool.clean {
		model.generate_sentence(0, Some(50)).unwrap().unwrap();
	}
	pool.compiled[0].generate_sentence(500, Some(200)).unwrap().unwrap();

	let summary = fx.engine.summary(&fx.stats).unwrap();
	assert_eq!(summary.ready_models, 6);
	assert_eq!(summary.total_sentences, 4);
	assert_eq!(summary.total_short_sentences, 1);

	let unused = SentenceStats::new();
	assert_eq!(fx.engine.summary(&unused).unwrap().total_sentences, 0);
}
