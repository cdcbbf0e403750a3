use std::path::Path;
use std::sync::Arc;

use log::info;
use markov_gen_core::config::MarkovConfig;
use markov_gen_core::events::SentenceStats;
use markov_gen_core::io::read_file;
use markov_gen_core::model::{BuildOptions, CombineMode, Combined, Engine, ReturnType};
use markov_gen_core::store::FileStore;

const DATA: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data");

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG=debug to follow each generation attempt
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let data = Path::new(DATA);

    // Every key of the TOML file is optional, missing ones keep their default
    let config = MarkovConfig::from_toml_str(&std::fs::read_to_string(data.join("markov.toml"))?)?;

    // Models are stored as one JSON document per model in "data/models"
    let store = Arc::new(FileStore::open(data.join("models"))?);
    let stats = Arc::new(SentenceStats::new());
    let engine = Engine::builder(store)
        .config(config)
        .listener(stats.clone())
        .build()?;

    // One entry per line of the corpus
    let corpus = read_file(data.join("corpus.txt"))?;
    let (first_half, second_half) = corpus.split_at(corpus.len() / 2);

    // Build a model from the first half, then merge the second half into it
    let mut model = engine.create_model()?;
    model.build(first_half, BuildOptions::default())?;
    model.augment(second_half, None, Some(&[1.0, 2.0][..]))?;
    info!("model {} is ready: {}", model.id(), model.is_ready());

    // 0 means no length limit
    for i in 0..5 {
        match model.generate_sentence(0, None)? {
            Some(sentence) => println!("Generated sentence {}: {}", i + 1, sentence),
            None => println!("No sentence after the configured number of attempts"),
        }
    }
    for i in 0..5 {
        match model.generate_sentence(60, None)? {
            Some(sentence) => println!("Generated short sentence {}: {}", i + 1, sentence),
            None => println!("No sentence shorter than 60 characters"),
        }
    }

    // A second model, compiled when stored: it can no longer be augmented
    let mut frozen = engine.create_model()?;
    frozen.build(&corpus, BuildOptions { store_compiled: Some(true), ..BuildOptions::default() })?;
    match frozen.augment(&["As you wish."], None, None) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("Compiled model refused the augmentation: {}", e),
    }

    // Permissive mode skips the compiled model, strict mode refuses the batch
    let outcome = engine.combine_models(&[&model, &frozen], CombineMode::Permissive, ReturnType::Transient, None);
    match outcome {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("Permissive combination with one usable model: {}", e),
    }
    let twin = engine.load_model(&model.id())?;
    let outcome = engine.combine_models(&[&model, &twin], CombineMode::Strict, ReturnType::Persisted, Some(&[1.0, 0.5][..]))?;
    if let Combined::Model(combined) = outcome.result {
        println!("Combined {} models into {}", outcome.merged, combined.id());
        if let Some(sentence) = combined.generate_sentence(0, None)? {
            println!("Generated from the combination: {}", sentence);
        }
        engine.delete_model(&combined.id())?;
    }

    let summary = engine.summary(&stats)?;
    println!(
        "{} ready models, {} sentences generated ({} with a length limit)",
        summary.ready_models, summary.total_sentences, summary.total_short_sentences
    );

    // Clean up the demo models
    engine.delete_model(&model.id())?;
    engine.delete_model(&frozen.id())?;

    Ok(())
}
