use regex::Regex;
use std::sync::OnceLock;

use super::{Pos, SynsetId};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Pointer {
    pub symbol: String,
    pub target: SynsetId,
}

#[derive(Debug, Clone)]
pub(crate) struct DataRecord {
    pub offset: u32,
    pub ss_type: Pos,
    pub words: Vec<String>,
    pub pointers: Vec<Pointer>,
    pub gloss: String,
}

#[derive(Debug, Clone)]
pub(crate) struct IndexRecord {
    pub lemma: String,
    pub pos: Pos,
    pub offsets: Vec<u32>,
}

/// Lines starting with whitespace are the license header of the database files.
pub(crate) fn is_header(line: &str) -> bool {
    line.starts_with(' ') || line.trim().is_empty()
}

/// Parse one line of a `data.*` file:
/// `offset lex_filenum ss_type w_cnt word lex_id [...] p_cnt [ptr...] [frames...] | gloss`
pub(crate) fn parse_data_line(line: &str) -> Result<DataRecord, String> {
    let (columns, gloss) = match line.split_once('|') {
        Some((columns, gloss)) => (columns, gloss.trim()),
        None => (line, ""),
    };

    let mut tokens = columns.split_whitespace();
    let mut next = |what: &str| tokens.next().ok_or_else(|| format!("missing {}", what));

    let offset = next("synset offset")?
        .parse::<u32>()
        .map_err(|e| format!("invalid synset offset: {}", e))?;
    let _lex_filenum = next("lex_filenum")?;
    let ss_type = next("ss_type")?;
    let ss_type = ss_type
        .chars()
        .next()
        .and_then(Pos::from_char)
        .ok_or_else(|| format!("unknown synset type '{}'", ss_type))?;

    let w_cnt = usize::from_str_radix(next("w_cnt")?, 16)
        .map_err(|e| format!("invalid w_cnt: {}", e))?;
    let mut words = Vec::with_capacity(w_cnt);
    for _ in 0..w_cnt {
        let word = next("word")?;
        let _lex_id = next("lex_id")?;
        words.push(strip_adjective_marker(word).to_string());
    }

    let p_cnt = next("p_cnt")?
        .parse::<usize>()
        .map_err(|e| format!("invalid p_cnt: {}", e))?;
    let mut pointers = Vec::with_capacity(p_cnt);
    for _ in 0..p_cnt {
        let symbol = next("pointer symbol")?.to_string();
        let target_offset = next("pointer offset")?
            .parse::<u32>()
            .map_err(|e| format!("invalid pointer offset: {}", e))?;
        let pos = next("pointer pos")?;
        let pos = pos
            .chars()
            .next()
            .and_then(Pos::from_char)
            .ok_or_else(|| format!("unknown pointer pos '{}'", pos))?;
        let _source_target = next("pointer source/target")?;
        pointers.push(Pointer {
            symbol,
            target: SynsetId::new(pos, target_offset),
        });
    }

    // verb frames follow the pointers and are not used here

    Ok(DataRecord {
        offset,
        ss_type,
        words,
        pointers,
        gloss: gloss.to_string(),
    })
}

/// Parse one line of an `index.*` file:
/// `lemma pos synset_cnt p_cnt [ptr_symbol...] sense_cnt tagsense_cnt synset_offset [...]`
pub(crate) fn parse_index_line(line: &str) -> Result<IndexRecord, String> {
    let mut tokens = line.split_whitespace();
    let mut next = |what: &str| tokens.next().ok_or_else(|| format!("missing {}", what));

    let lemma = next("lemma")?.to_string();
    let pos = next("pos")?;
    let pos = pos
        .chars()
        .next()
        .and_then(Pos::from_char)
        .ok_or_else(|| format!("unknown pos '{}'", pos))?;

    let synset_cnt = next("synset_cnt")?
        .parse::<usize>()
        .map_err(|e| format!("invalid synset_cnt: {}", e))?;
    let p_cnt = next("p_cnt")?
        .parse::<usize>()
        .map_err(|e| format!("invalid p_cnt: {}", e))?;
    for _ in 0..p_cnt {
        next("pointer symbol")?;
    }
    let _sense_cnt = next("sense_cnt")?;
    let _tagsense_cnt = next("tagsense_cnt")?;

    let mut offsets = Vec::with_capacity(synset_cnt);
    for _ in 0..synset_cnt {
        let offset = next("synset offset")?
            .parse::<u32>()
            .map_err(|e| format!("invalid synset offset: {}", e))?;
        offsets.push(offset);
    }

    Ok(IndexRecord { lemma, pos, offsets })
}

/// Parse one line of a `*.exc` file: `inflected base [base...]`.
pub(crate) fn parse_exception_line(line: &str) -> Option<(String, Vec<String>)> {
    let mut tokens = line.split_whitespace();
    let inflected = tokens.next()?.to_string();
    let bases: Vec<String> = tokens.map(str::to_string).collect();
    if bases.is_empty() {
        return None;
    }
    Some((inflected, bases))
}

/// Split a gloss into its definition and quoted examples.
pub(crate) fn split_gloss(gloss: &str) -> (String, Vec<String>) {
    static QUOTED: OnceLock<Regex> = OnceLock::new();
    let quoted = QUOTED.get_or_init(|| Regex::new(r#""([^"]*)""#).expect("valid regex"));

    let examples = quoted
        .captures_iter(gloss)
        .map(|c| c[1].to_string())
        .collect();

    let definition = quoted.replace_all(gloss, "");
    let definition = definition
        .trim()
        .trim_matches(|c| c == ';' || c == ' ')
        .to_string();

    (definition, examples)
}

// adjective lemmas may carry a syntactic marker: "long(a)", "elect(p)"
fn strip_adjective_marker(word: &str) -> &str {
    if word.ends_with(')') {
        if let Some(open) = word.find('(') {
            return &word[..open];
        }
    }
    word
}
