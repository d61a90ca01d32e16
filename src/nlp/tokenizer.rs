use regex::Regex;
use std::sync::OnceLock;

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

impl Rule {
    fn new(pattern: &str, replacement: &'static str) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("valid tokenizer regex"),
            replacement,
        }
    }

    fn apply(&self, text: String) -> String {
        self.pattern.replace_all(&text, self.replacement).into_owned()
    }
}

struct Rules {
    starting_quotes: Vec<Rule>,
    punctuation: Vec<Rule>,
    brackets: Rule,
    double_dashes: Rule,
    ending_quotes: Vec<Rule>,
    contractions: Vec<Rule>,
}

fn rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(|| Rules {
        starting_quotes: vec![
            Rule::new(r#"^""#, "``"),
            Rule::new(r"(``)", " ${1} "),
            Rule::new(r#"([ (\[{<])("|'')"#, "${1} `` "),
        ],
        punctuation: vec![
            Rule::new(r"([:,])([^\d])", " ${1} ${2}"),
            Rule::new(r"([:,])$", " ${1} "),
            Rule::new(r"\.\.\.", " ... "),
            Rule::new(r"[;@#$%&]", " ${0} "),
            Rule::new(r#"([^.])(\.)([\])}>"']*)\s*$"#, "${1} ${2}${3} "),
            Rule::new(r"[?!]", " ${0} "),
            Rule::new(r"([^'])' ", "${1} ' "),
        ],
        brackets: Rule::new(r"[\]\[(){}<>]", " ${0} "),
        double_dashes: Rule::new(r"--", " -- "),
        ending_quotes: vec![
            Rule::new(r#"""#, " '' "),
            Rule::new(r"(\S)('')", "${1} ${2} "),
            Rule::new(r"([^' ])('[sS]|'[mM]|'[dD]|') ", "${1} ${2} "),
            Rule::new(r"([^' ])('ll|'LL|'re|'RE|'ve|'VE|n't|N'T) ", "${1} ${2} "),
        ],
        contractions: vec![
            Rule::new(r"(?i)\b(can)(not)\b", " ${1} ${2} "),
            Rule::new(r"(?i)\b(gon)(na)\b", " ${1} ${2} "),
            Rule::new(r"(?i)\b(got)(ta)\b", " ${1} ${2} "),
            Rule::new(r"(?i)\b(wan)(na)\s", " ${1} ${2} "),
        ],
    })
}

/// Split text into Penn Treebank style tokens.
pub fn word_tokenize(text: &str) -> Vec<String> {
    let rules = rules();
    let mut text = text.to_string();

    for rule in &rules.starting_quotes {
        text = rule.apply(text);
    }
    for rule in &rules.punctuation {
        text = rule.apply(text);
    }
    text = rules.brackets.apply(text);
    text = rules.double_dashes.apply(text);

    text = format!(" {} ", text);
    for rule in &rules.ending_quotes {
        text = rule.apply(text);
    }
    for rule in &rules.contractions {
        text = rule.apply(text);
    }

    text.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_tokens() {
        let tokens = word_tokenize("the rising of a body of water and its overflowing onto normally dry land");
        assert_eq!(tokens.len(), 14);
        assert_eq!(tokens[0], "the");
        assert_eq!(tokens[13], "land");
    }

    #[test]
    fn test_punctuation_and_brackets() {
        let tokens = word_tokenize("a large natural stream of water (larger than a creek), usually.");
        assert_eq!(
            tokens,
            vec![
                "a", "large", "natural", "stream", "of", "water", "(", "larger", "than", "a", "creek", ")", ",",
                "usually", "."
            ]
        );
    }

    #[test]
    fn test_contractions_and_quotes() {
        let tokens = word_tokenize("\"It's the earth's surface\" isn't it");
        assert_eq!(
            tokens,
            vec!["``", "It", "'s", "the", "earth", "'s", "surface", "''", "is", "n't", "it"]
        );
    }

    #[test]
    fn test_cannot_is_split() {
        assert_eq!(word_tokenize("cannot flow"), vec!["can", "not", "flow"]);
    }

    #[test]
    fn test_empty_text() {
        assert!(word_tokenize("   ").is_empty());
    }
}
