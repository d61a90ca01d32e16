pub mod morphy;
mod parser;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum WordNetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}:{line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },

    #[error("no WordNet data files found in {0}")]
    Empty(PathBuf),
}

/// WordNet synset type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pos {
    #[serde(rename = "n")]
    Noun,
    #[serde(rename = "v")]
    Verb,
    #[serde(rename = "a")]
    Adjective,
    #[serde(rename = "s")]
    Satellite,
    #[serde(rename = "r")]
    Adverb,
}

impl Pos {
    /// Order in which senses of a lemma are enumerated.
    pub const LOOKUP_ORDER: [Pos; 4] = [Pos::Noun, Pos::Verb, Pos::Adjective, Pos::Adverb];

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'n' => Some(Pos::Noun),
            'v' => Some(Pos::Verb),
            'a' => Some(Pos::Adjective),
            's' => Some(Pos::Satellite),
            'r' => Some(Pos::Adverb),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Pos::Noun => 'n',
            Pos::Verb => 'v',
            Pos::Adjective => 'a',
            Pos::Satellite => 's',
            Pos::Adverb => 'r',
        }
    }

    /// Satellites are stored with the head adjectives.
    pub fn file_pos(self) -> Self {
        match self {
            Pos::Satellite => Pos::Adjective,
            other => other,
        }
    }

    pub fn file_stem(self) -> &'static str {
        match self.file_pos() {
            Pos::Noun => "noun",
            Pos::Verb => "verb",
            Pos::Adjective | Pos::Satellite => "adj",
            Pos::Adverb => "adv",
        }
    }

    pub fn is_adjective(self) -> bool {
        matches!(self, Pos::Adjective | Pos::Satellite)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Identity of a synset: the data file it lives in and its byte offset there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SynsetId {
    pub pos: Pos,
    pub offset: u32,
}

impl SynsetId {
    pub fn new(pos: Pos, offset: u32) -> Self {
        Self {
            pos: pos.file_pos(),
            offset,
        }
    }
}

impl fmt::Display for SynsetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08}-{}", self.offset, self.pos)
    }
}

#[derive(Debug, Clone)]
pub struct Synset {
    pub id: SynsetId,
    pub pos: Pos,
    pub lemmas: Vec<String>,
    pub definition: String,
    pub examples: Vec<String>,
    pub hypernyms: Vec<SynsetId>,
}

impl Synset {
    /// `river.n`-style name, using the first lemma.
    pub fn name(&self) -> String {
        self.lemmas
            .first()
            .map(|l| format!("{}.{}", l.to_lowercase(), self.pos))
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// In-memory view of the WordNet lexical database.
#[derive(Debug, Default)]
pub struct WordNet {
    synsets: HashMap<SynsetId, Synset>,
    index: HashMap<Pos, HashMap<String, Vec<u32>>>,
    exceptions: HashMap<Pos, HashMap<String, Vec<String>>>,
}

impl WordNet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a WordNet `dict/` directory (`data.*`, `index.*`, optional `*.exc`).
    pub fn open<P: AsRef<Path>>(dict_dir: P) -> Result<Self, WordNetError> {
        let dict_dir = dict_dir.as_ref();
        let mut wordnet = Self::empty();
        let mut data_files = 0;

        for pos in Pos::LOOKUP_ORDER {
            let stem = pos.file_stem();

            let data_path = dict_dir.join(format!("data.{}", stem));
            if data_path.exists() {
                let content = read(&data_path)?;
                wordnet.add_data_file(&data_path.display().to_string(), &content)?;
                data_files += 1;
            } else {
                warn!("WordNet data file missing: {}", data_path.display());
            }

            let index_path = dict_dir.join(format!("index.{}", stem));
            if index_path.exists() {
                let content = read(&index_path)?;
                wordnet.add_index_file(&index_path.display().to_string(), &content)?;
            } else {
                warn!("WordNet index file missing: {}", index_path.display());
            }

            let exc_path = dict_dir.join(format!("{}.exc", stem));
            if exc_path.exists() {
                let content = read(&exc_path)?;
                wordnet.add_exception_file(pos, &content);
            }
        }

        if data_files == 0 {
            return Err(WordNetError::Empty(dict_dir.to_path_buf()));
        }

        info!(
            "WordNet loaded from {}: {} synsets, {} lemmas",
            dict_dir.display(),
            wordnet.synsets.len(),
            wordnet.lemma_count()
        );

        Ok(wordnet)
    }

    pub fn add_data_file(&mut self, file: &str, content: &str) -> Result<usize, WordNetError> {
        let mut added = 0;
        for (number, line) in content.lines().enumerate() {
            if parser::is_header(line) {
                continue;
            }

            let record = parser::parse_data_line(line).map_err(|message| WordNetError::Parse {
                file: file.to_string(),
                line: number + 1,
                message,
            })?;

            let (definition, examples) = parser::split_gloss(&record.gloss);
            let hypernyms = record
                .pointers
                .iter()
                .filter(|p| p.symbol == "@")
                .map(|p| p.target)
                .collect();

            let id = SynsetId::new(record.ss_type, record.offset);
            self.synsets.insert(
                id,
                Synset {
                    id,
                    pos: record.ss_type,
                    lemmas: record.words,
                    definition,
                    examples,
                    hypernyms,
                },
            );
            added += 1;
        }

        debug!("Loaded {} synsets from {}", added, file);
        Ok(added)
    }

    pub fn add_index_file(&mut self, file: &str, content: &str) -> Result<usize, WordNetError> {
        let mut added = 0;
        for (number, line) in content.lines().enumerate() {
            if parser::is_header(line) {
                continue;
            }

            let record = parser::parse_index_line(line).map_err(|message| WordNetError::Parse {
                file: file.to_string(),
                line: number + 1,
                message,
            })?;

            self.index
                .entry(record.pos.file_pos())
                .or_default()
                .insert(record.lemma, record.offsets);
            added += 1;
        }

        debug!("Loaded {} index entries from {}", added, file);
        Ok(added)
    }

    pub fn add_exception_file(&mut self, pos: Pos, content: &str) {
        let map = self.exceptions.entry(pos.file_pos()).or_default();
        for line in content.lines() {
            if let Some((inflected, bases)) = parser::parse_exception_line(line) {
                map.insert(inflected, bases);
            }
        }
    }

    pub fn synset(&self, id: SynsetId) -> Option<&Synset> {
        self.synsets.get(&id)
    }

    pub fn synset_count(&self) -> usize {
        self.synsets.len()
    }

    pub fn lemma_count(&self) -> usize {
        self.index.values().map(HashMap::len).sum()
    }

    /// Base forms of `form` that have an index entry for `pos`, in rule order.
    pub fn morphy(&self, form: &str, pos: Pos) -> Vec<String> {
        let pos = pos.file_pos();
        let exceptions = self.exceptions.get(&pos).and_then(|m| m.get(form));
        let index = match self.index.get(&pos) {
            Some(index) => index,
            None => return Vec::new(),
        };

        let mut seen = HashSet::new();
        morphy::candidates(form, pos, exceptions)
            .into_iter()
            .filter(|candidate| index.contains_key(candidate))
            .filter(|candidate| seen.insert(candidate.clone()))
            .collect()
    }

    /// All senses of `term` restricted to one part of speech.
    pub fn synsets_for_pos(&self, term: &str, pos: Pos) -> Vec<&Synset> {
        let lemma = term.to_lowercase();
        let pos = pos.file_pos();
        let index = match self.index.get(&pos) {
            Some(index) => index,
            None => return Vec::new(),
        };

        let mut senses = Vec::new();
        for form in self.morphy(&lemma, pos) {
            for &offset in index.get(&form).into_iter().flatten() {
                match self.synsets.get(&SynsetId::new(pos, offset)) {
                    Some(synset) => senses.push(synset),
                    None => warn!("Index entry {} points at missing synset {:08}-{}", form, offset, pos),
                }
            }
        }
        senses
    }

    /// All senses of `term`, nouns first, then verbs, adjectives and adverbs.
    ///
    /// The position of a synset in this list is its sense index.
    pub fn synsets(&self, term: &str) -> Vec<&Synset> {
        Pos::LOOKUP_ORDER
            .iter()
            .flat_map(|&pos| self.synsets_for_pos(term, pos))
            .collect()
    }

    /// The synset followed by the trees of each of its hypernyms, flattened in
    /// pre-order. Synsets reachable along several paths appear once per path.
    pub fn hypernym_tree(&self, id: SynsetId) -> Vec<SynsetId> {
        let mut tree = Vec::new();
        let mut path = Vec::new();
        self.walk_hypernyms(id, &mut path, &mut tree);
        tree
    }

    fn walk_hypernyms(&self, id: SynsetId, path: &mut Vec<SynsetId>, tree: &mut Vec<SynsetId>) {
        tree.push(id);
        path.push(id);
        if let Some(synset) = self.synsets.get(&id) {
            for &hypernym in &synset.hypernyms {
                if path.contains(&hypernym) {
                    warn!("Hypernym cycle at {} -> {}", id, hypernym);
                    continue;
                }
                self.walk_hypernyms(hypernym, path, tree);
            }
        }
        path.pop();
    }
}

fn read(path: &Path) -> Result<String, WordNetError> {
    fs::read_to_string(path).map_err(|source| WordNetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub const DATA_NOUN: &str = "\
\x20 1 This software and database is being provided to you, the LICENSEE, by
00001740 03 n 01 entity 0 000 | that which is perceived or known or inferred
00002137 03 n 01 abstraction 0 001 @ 00001740 n 0000 | a general concept
00024720 26 n 01 state 0 001 @ 00002137 n 0000 | the way something is with respect to its main attributes
00025000 26 n 01 condition 0 001 @ 00024720 n 0000 | a state at a particular time
00030000 07 n 01 act 0 001 @ 00002137 n 0000 | something that people do or cause to happen
00040000 17 n 01 body_of_water 0 001 @ 00001740 n 0000 | the part of the earth's surface covered with water
00041000 17 n 02 river 0 stream 0 001 @ 00040000 n 0000 | a large natural stream of water; \"the river was navigable\"
00050000 26 n 01 flood 0 002 @ 00025000 n 0000 @ 00030000 n 0000 | the rising of a body of water and its overflowing onto normally dry land
00051000 17 n 01 flood 0 001 @ 00040000 n 0000 | a large flow
00052000 26 n 01 deluge 0 001 @ 00025000 n 0000 | an overwhelming flood
00060000 05 n 01 goose 0 000 | web-footed long-necked typically gregarious migratory aquatic birds
";

    pub const INDEX_NOUN: &str = "\
\x20 1 This software and database is being provided to you, the LICENSEE, by
abstraction n 1 1 @ 1 0 00002137
act n 1 1 @ 1 0 00030000
body_of_water n 1 1 @ 1 0 00040000
condition n 1 1 @ 1 0 00025000
deluge n 1 1 @ 1 0 00052000
entity n 1 0 1 0 00001740
flood n 2 1 @ 2 0 00050000 00051000
goose n 1 0 1 0 00060000
river n 1 1 @ 1 0 00041000
state n 1 1 @ 1 0 00024720
stream n 1 1 @ 1 0 00041000
";

    pub const DATA_VERB: &str = "\
00100000 30 v 01 change 0 000 01 + 01 00 | undergo a change
00101000 30 v 01 flood 0 001 @ 00100000 v 0000 01 + 01 00 | fill quickly beyond capacity
";

    pub const INDEX_VERB: &str = "\
change v 1 1 @ 1 0 00100000
flood v 1 1 @ 1 0 00101000
";

    pub const NOUN_EXC: &str = "geese goose\n";

    pub fn sample() -> WordNet {
        let mut wordnet = WordNet::empty();
        wordnet.add_data_file("data.noun", DATA_NOUN).unwrap();
        wordnet.add_index_file("index.noun", INDEX_NOUN).unwrap();
        wordnet.add_data_file("data.verb", DATA_VERB).unwrap();
        wordnet.add_index_file("index.verb", INDEX_VERB).unwrap();
        wordnet.add_exception_file(Pos::Noun, NOUN_EXC);
        wordnet
    }
}
