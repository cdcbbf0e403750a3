#![allow(dead_code)]

use std::sync::Arc;

use markov_gen_core::config::MarkovConfig;
use markov_gen_core::events::SentenceStats;
use markov_gen_core::model::{BuildOptions, Engine, MarkovModel};
use markov_gen_core::store::{MemoryStore, ModelStore};

/// Sample text from http://loremricksum.com
pub const SAMPLE_CORPUS: &str = "
Summer, next time we're hiding in a chlorkian echo nest, can you do me a favour and turn your ringer off?! I wanna be alive, I am alive! Alive i tell you. Mother, I love you. Those are no longer just words. I wanna hold you. I wanna run in a stream. I wanna taste ice cream, but not just put it in my mouth and let it slide down my throat, but really eat it! Remote override engaged. No! Yes. Bypassing override! Hello. You know what shy pooping is, Rick? Let's be post-apocalyptic scavengers!

Don't be trippin dog we got you. Reminding you that tonight is our annual flu season dance. I don't know how many times I have to say this, but if you have the flu, stay home. The flu season dance is about awareness, not celebration. 'Quantum carburetor'? Jesus, Morty. You can't just add a Sci-Fi word to a car word and hope it means something. Huh, looks like something's wrong with the microverse battery. We're gonna have to go inside.

I was just killing some snakes up here like everyone else, I guess, and finishing the Christmas lights. Wha, me irresponsible?! All I wanted you to do was to hand me a screwdriver, Morty! There is no god, Summer; gotta rip that band-aid off now you'll thank me later.

Wait, the whole time? I was screaming for help, and you stayed on the roof? Snuffles was my slave name. You can call me Snowball, because my fur is pretty and white. You're our boy dawg, don't even trip.

That, out there. That's my grave. On one of our adventures Rick and I basically destroyed the whole world. So we bailed on that reality and we came to this one. Because in this one the world wasn't destroyed. And in this one, we were dead. You know my name, that's disarming. Oh you agree huh? Well guess what, I made him up. You really are your father's children. Think for yourselves, don't be sheep. You're missing the point Morty. Why would he drive a smaller toaster with wheels? I mean, does your car look like a smaller version of your house? No.
";

pub struct Fixture {
	pub store: Arc<MemoryStore>,
	pub stats: Arc<SentenceStats>,
	pub engine: Engine,
}

pub fn fixture(config: MarkovConfig) -> Fixture {
	let store = Arc::new(MemoryStore::new());
	let stats = Arc::new(SentenceStats::new());
	let engine = Engine::builder(store.clone())
		.config(config)
		.listener(stats.clone())
		.build()
		.unwrap();
	Fixture { store, stats, engine }
}

pub fn uncompiled(engine: &Engine, entries: &[&str]) -> MarkovModel {
	let mut model = engine.create_model().unwrap();
	model
		.build(entries, BuildOptions { store_compiled: Some(false), ..BuildOptions::default() })
		.unwrap();
	model
}

pub fn compiled(engine: &Engine, entries: &[&str]) -> MarkovModel {
	let mut model = engine.create_model().unwrap();
	model
		.build(entries, BuildOptions { store_compiled: Some(true), ..BuildOptions::default() })
		.unwrap();
	model
}

/// Stored JSON of a model, to compare before and after a failed call.
pub fn raw(store: &MemoryStore, model: &MarkovModel) -> String {
	store.raw(&model.id()).unwrap()
}

pub fn stored_ids(store: &dyn ModelStore) -> usize {
	store.list_ids().unwrap().len()
}
