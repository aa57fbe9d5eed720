//! Keyword vocabulary.
//!
//! The vocabulary is plain data: a versioned list of spellings, each tagged with a
//! tier and a role. The scanner and the statement assembler only ever ask it
//! questions, so recognising a new statement keyword means adding a row here (or
//! to a JSON table loaded at start-up), never touching the algorithms.

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::chars::is_whole_word;
use crate::error::VocabularyError;
use crate::token::{Role, Tier};

pub const STANDARD_VERSION: &str = "qlik-script/1";

const CONTROL_LEADERS: &[&str] = &[
    "if", "elseif", "else", "endif", "end if", "end",
    "sub", "endsub", "end sub", "call",
    "for", "for each", "next",
    "do", "do while", "do until", "loop", "loop while", "loop until",
    "exit", "exit for", "exit do", "exit sub", "exit script",
    "switch", "case", "default", "endswitch", "end switch",
];

const CONTROL_HEADER_ENDS: &[&str] = &["then"];

const CONTROL_CLAUSES: &[&str] = &["to", "step", "while", "until", "each", "in"];

const SCRIPT_LEADERS: &[&str] = &[
    // Data loading
    "load", "select", "sql", "store",
    // Variables
    "set", "let",
    // Connections
    "binary", "connect", "connect to", "lib connect to", "custom connect to",
    "disconnect", "directory", "direct query", "import live",
    // Table operations
    "drop", "drop table", "drop tables", "drop field", "drop fields",
    "rename", "rename table", "rename tables", "rename field", "rename fields",
    "qualify", "unqualify", "map", "unmap", "star",
    "loosen", "loosen table", "loosen tables", "inputfield",
    // Prefixes and joins
    "mapping", "concatenate", "noconcatenate", "crosstable",
    "hierarchy", "hierarchybelongsto", "intervalmatch", "generic", "semantic",
    "join", "keep", "left", "right", "inner", "outer",
    "left join", "right join", "inner join", "outer join",
    "left keep", "right keep", "inner keep",
    "buffer", "replace", "add", "bundle", "info", "sample", "first", "merge",
    // Sections
    "section", "section access", "section application",
    // Metadata
    "comment", "comment table", "comment field", "comment fields",
    "tag", "tag field", "tag fields", "untag", "untag field", "untag fields",
    "derive", "declare", "alias", "autonumber",
    "sqlcolumns", "sqltables", "sqltypes",
    // Other statements
    "trace", "sleep", "execute", "search", "flushlog",
    "nullasvalue", "nullasnull", "force",
];

const SCRIPT_CLAUSES: &[&str] = &[
    "into", "from", "where", "resident", "inline", "autogenerate", "as", "distinct",
    "group", "by", "order", "group by", "order by",
    "odbc", "oledb", "lib", "query", "direct", "import", "live",
    "table", "tables", "field", "fields", "using", "is",
    "when", "unless", "only",
    "access", "application", "script",
    "measure", "dimension", "create", "relationship",
    "qsl", "custom", "customconnect", "bdi",
    "capitalization", "upper", "lower", "mixed",
    "incremental", "stale", "after",
    "asc", "desc", "with", "on", "include", "null", "value", "total",
];

const LOGICAL_OPERATORS: &[&str] = &[
    "and", "or", "not", "xor", "like", "precedes", "follows",
    "bitand", "bitor", "bitxor", "bitnot",
];

/// Keywords that are also script function names, e.g. `If(a, b, c)`.
const CALLABLE: &[&str] = &[
    "if", "left", "right", "replace", "upper", "lower", "null", "only", "autonumber",
];

lazy_static! {
    static ref STANDARD: Vocabulary = Vocabulary::build(standard_table());
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub spelling: String,
    pub tier: Tier,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub callable: bool,
}

impl KeywordEntry {
    pub fn new(spelling: &str, tier: Tier, role: Role) -> Self {
        Self {
            spelling: spelling.to_string(),
            tier,
            role,
            callable: false,
        }
    }

    /// Upper-case spelling with single spaces between words.
    pub fn canonical(&self) -> String {
        self.spelling
            .split_whitespace()
            .map(|word| word.to_uppercase())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn key(&self) -> String {
        self.spelling
            .split_whitespace()
            .map(|word| word.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Serialized form of a vocabulary, as stored in JSON files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyTable {
    pub version: String,
    pub keywords: Vec<KeywordEntry>,
}

/// Validated, indexed, read-only keyword vocabulary.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    version: String,
    entries: Vec<KeywordEntry>,
    canonical: Vec<String>,
    index: HashMap<String, usize>,
    prefixes: HashSet<String>,
    max_words: usize,
}

impl Vocabulary {
    /// The built-in Qlik script vocabulary, built once per process.
    pub fn standard() -> &'static Vocabulary {
        &STANDARD
    }

    pub fn from_table(table: VocabularyTable) -> Result<Self, VocabularyError> {
        let mut seen = HashSet::new();
        for entry in &table.keywords {
            let words: Vec<&str> = entry.spelling.split_whitespace().collect();
            if words.is_empty() {
                return Err(VocabularyError::EmptySpelling);
            }
            if let Some(word) = words.iter().find(|word| !is_whole_word(word)) {
                return Err(VocabularyError::InvalidWord {
                    spelling: entry.spelling.clone(),
                    word: word.to_string(),
                });
            }
            if entry.tier == Tier::Logical && words.len() > 1 {
                return Err(VocabularyError::MultiWordOperator(entry.spelling.clone()));
            }
            if !seen.insert(entry.key()) {
                return Err(VocabularyError::Duplicate(entry.canonical()));
            }
        }
        Ok(Self::build(table))
    }

    pub fn from_json(json: &str) -> Result<Self, VocabularyError> {
        let table: VocabularyTable = serde_json::from_str(json)?;
        Self::from_table(table)
    }

    fn build(table: VocabularyTable) -> Self {
        let mut index = HashMap::new();
        let mut prefixes = HashSet::new();
        let mut max_words = 1;

        for (i, entry) in table.keywords.iter().enumerate() {
            let key = entry.key();
            let words: Vec<&str> = key.split(' ').collect();
            max_words = max_words.max(words.len());
            for n in 1..words.len() {
                prefixes.insert(words[..n].join(" "));
            }
            index.insert(key, i);
        }

        Self {
            version: table.version,
            canonical: table.keywords.iter().map(KeywordEntry::canonical).collect(),
            entries: table.keywords,
            index,
            prefixes,
            max_words,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Longest keyword in words.
    pub fn max_words(&self) -> usize {
        self.max_words
    }

    /// Finds the entry spelled exactly by `words`, ignoring case.
    pub fn lookup(&self, words: &[&str]) -> Option<&KeywordEntry> {
        self.lookup_index(words).map(|i| &self.entries[i])
    }

    /// Upper-case spelling of the entry spelled by `words`.
    pub fn canonical(&self, words: &[&str]) -> Option<&str> {
        self.lookup_index(words).map(|i| self.canonical[i].as_str())
    }

    /// True when some multi-word entry starts with `words` and is longer than it.
    pub fn is_prefix(&self, words: &[&str]) -> bool {
        self.prefixes.contains(&key_of(words))
    }

    pub fn to_table(&self) -> VocabularyTable {
        VocabularyTable {
            version: self.version.clone(),
            keywords: self.entries.clone(),
        }
    }

    fn lookup_index(&self, words: &[&str]) -> Option<usize> {
        if words.is_empty() || words.len() > self.max_words {
            return None;
        }
        self.index.get(&key_of(words)).copied()
    }
}

fn key_of(words: &[&str]) -> String {
    words
        .iter()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn standard_table() -> VocabularyTable {
    let groups: [(&[&str], Tier, Role); 6] = [
        (CONTROL_LEADERS, Tier::Control, Role::Leader),
        (CONTROL_HEADER_ENDS, Tier::Control, Role::HeaderEnd),
        (CONTROL_CLAUSES, Tier::Control, Role::Clause),
        (SCRIPT_LEADERS, Tier::Script, Role::Leader),
        (SCRIPT_CLAUSES, Tier::Script, Role::Clause),
        (LOGICAL_OPERATORS, Tier::Logical, Role::Clause),
    ];

    let keywords = groups
        .iter()
        .flat_map(|(spellings, tier, role)| {
            spellings.iter().map(move |spelling| {
                let mut entry = KeywordEntry::new(spelling, *tier, *role);
                entry.callable = CALLABLE.contains(spelling);
                entry
            })
        })
        .collect();

    VocabularyTable {
        version: STANDARD_VERSION.to_string(),
        keywords,
    }
}
