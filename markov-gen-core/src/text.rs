use std::sync::LazyLock;

use regex::Regex;

use crate::model::state::Token;

/// Sentence boundary: terminal punctuation, optional closing quotes or
/// brackets, then whitespace.
static SENTENCE_END: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"[.!?…]+['"’”)\]]*\s+"#).expect("valid sentence regex"));

/// Paragraph break: a line break surrounded by optional blank space.
static PARAGRAPH_BREAK: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\s*\n\s*\n\s*").expect("valid paragraph regex"));

/// Words (with inner apostrophes or hyphens) or runs of punctuation.
static WORD_OR_PUNCT: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\w+(?:['’\-]\w+)*|[^\w\s]+").expect("valid token regex"));

/// Turns text into tokens and tokens back into text.
///
/// The chain engine never looks inside tokens: any splitter can be
/// plugged in as long as `join(split(s))` reads like `s`.
pub trait WordSplitter: Send + Sync {
	/// Splits one sentence into tokens.
	fn split(&self, sentence: &str) -> Vec<Token>;

	/// Joins generated tokens into text. Sentinels are never passed in.
	fn join(&self, tokens: &[Token]) -> String;
}

/// Splits on whitespace, joins with single spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceSplitter;

impl WordSplitter for WhitespaceSplitter {
	fn split(&self, sentence: &str) -> Vec<Token> {
		sentence.split_whitespace().map(Token::new).collect()
	}

	fn join(&self, tokens: &[Token]) -> String {
		tokens.iter().map(Token::as_str).collect::<Vec<_>>().join(" ")
	}
}

/// Splits words from punctuation and tags every token.
///
/// Tokens are encoded `surface::TAG` with tags `WORD`, `NUM` and `PUNCT`,
/// so the same word used as a word and as a number never share
/// transitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaggedSplitter;

impl TaggedSplitter {
	pub const WORD: &'static str = "WORD";
	pub const NUM: &'static str = "NUM";
	pub const PUNCT: &'static str = "PUNCT";

	fn tag_of(surface: &str) -> &'static str {
		if surface.chars().all(|c| c.is_ascii_digit()) {
			Self::NUM
		} else if surface.chars().next().is_some_and(char::is_alphanumeric) || surface.starts_with('_') {
			Self::WORD
		} else {
			Self::PUNCT
		}
	}

	fn attaches_left(surface: &str) -> bool {
		surface.starts_with(['.', ',', '!', '?', ';', ':', ')', ']', '}', '…', '%'])
	}

	fn attaches_right(surface: &str) -> bool {
		matches!(surface, "(" | "[" | "{")
	}
}

impl WordSplitter for TaggedSplitter {
	fn split(&self, sentence: &str) -> Vec<Token> {
		WORD_OR_PUNCT
			.find_iter(sentence)
			.filter_map(|m| Token::tagged(m.as_str(), Self::tag_of(m.as_str())))
			.collect()
	}

	fn join(&self, tokens: &[Token]) -> String {
		let mut sentence = String::new();
		let mut glue_next = true;
		for token in tokens {
			let surface = token.surface();
			if !glue_next && !Self::attaches_left(surface) {
				sentence.push(' ');
			}
			sentence.push_str(surface);
			glue_next = Self::attaches_right(surface);
		}
		sentence
	}
}

/// Splits a corpus entry into sentences.
///
/// Paragraph breaks always end a sentence. Inside a paragraph, a sentence
/// ends after terminal punctuation followed by whitespace and an
/// uppercase letter. Lines inside a paragraph are joined.
pub fn split_into_sentences(text: &str) -> Vec<String> {
	let mut sentences = Vec::new();

	for paragraph in PARAGRAPH_BREAK.split(text) {
		let paragraph = paragraph.trim();
		let mut start = 0;

		for boundary in SENTENCE_END.find_iter(paragraph) {
			let next_is_upper = paragraph[boundary.end()..]
				.chars()
				.next()
				.is_some_and(|c| c.is_uppercase() || c.is_ascii_digit() || c == '\'' || c == '"');
			if !next_is_upper {
				continue;
			}
			push_sentence(&mut sentences, &paragraph[start..boundary.end()]);
			start = boundary.end();
		}
		push_sentence(&mut sentences, &paragraph[start..]);
	}

	sentences
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
	let sentence = raw.split_whitespace().collect::<Vec<_>>().join(" ");
	if !sentence.is_empty() {
		sentences.push(sentence);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn whitespace_round_trip() {
		let splitter = WhitespaceSplitter;
		let tokens = splitter.split("  My name   is Inigo Montoya. ");
		assert_eq!(tokens.len(), 5);
		assert_eq!(splitter.join(&tokens), "My name is Inigo Montoya.");
	}

	#[test]
	fn tagged_splitter_separates_punctuation() {
		let splitter = TaggedSplitter;
		let tokens = splitter.split("We're gonna have to go inside, Morty 2 times!");
		let surfaces: Vec<&str> = tokens.iter().map(Token::surface).collect();
		assert_eq!(
			surfaces,
			vec!["We're", "gonna", "have", "to", "go", "inside", ",", "Morty", "2", "times", "!"]
		);
		assert_eq!(tokens[6].tag(), Some(TaggedSplitter::PUNCT));
		assert_eq!(tokens[8].tag(), Some(TaggedSplitter::NUM));
		assert_eq!(tokens[0].tag(), Some(TaggedSplitter::WORD));
		assert_eq!(splitter.join(&tokens), "We're gonna have to go inside, Morty 2 times!");
	}

	#[test]
	fn tagged_join_handles_brackets() {
		let splitter = TaggedSplitter;
		let tokens = splitter.split("No relation (really).");
		assert_eq!(splitter.join(&tokens), "No relation (really).");
	}

	#[test]
	fn sentences_split_on_terminal_punctuation() {
		let text = "Mother, I love you. Those are no longer just words. I wanna hold you!\n\nNo relation";
		assert_eq!(
			split_into_sentences(text),
			vec![
				"Mother, I love you.",
				"Those are no longer just words.",
				"I wanna hold you!",
				"No relation",
			]
		);
	}

	#[test]
	fn lowercase_after_period_does_not_split() {
		assert_eq!(
			split_into_sentences("Wait... the whole time? Yes."),
			vec!["Wait... the whole time?", "Yes."]
		);
	}

	#[test]
	fn blank_text_has_no_sentences() {
		assert!(split_into_sentences("  \n\n \t").is_empty());
	}
}
