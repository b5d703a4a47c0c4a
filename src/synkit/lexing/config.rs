//! Lexer configuration
//!
//!     A [`LexerConfig`] describes everything that varies between DSLs at the lexical level:
//!     keyword sets, punctuation and operator strings, comment and string delimiters, numeric
//!     prefixes, and whether trivia is kept. It is plain data: grammars build it in code with
//!     the `with_*` methods, or ship it as JSON/YAML and load it with [`LexerConfig::load`].
//!
//!     A config is never mutated by the tokenizer. Before scanning, it is compiled into
//!     [`Rules`] (longest-first match tables and keyword lookup sets).
//!
//! Presets
//!
//!     - [`LexerConfig::c_like`]: C/Kotlin style with `//` and `/* */` comments, `"…"` and
//!       `"""…"""` strings with `$name`/`${…}` interpolation, `0x`/`0b`/`0o` integers and an
//!       `f` float suffix.
//!     - [`LexerConfig::assembly`]: case-insensitive mnemonics, `;` and `#` line comments,
//!       `.directive` identifiers, no interpolation.

use crate::synkit::token::IntegerBase;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Start/end delimiters of a block comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockComment {
    pub start: String,
    pub end: String,
}

impl BlockComment {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// The full lexical description of a language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LexerConfig {
    /// Keywords matched case-sensitively
    pub keywords: Vec<String>,
    /// Keywords matched case-insensitively
    pub keywords_ci: Vec<String>,
    /// Punctuation strings, matched longest-first before operators
    pub punctuation: Vec<String>,
    /// Operator strings, matched longest-first
    pub operators: Vec<String>,
    pub line_comments: Vec<String>,
    pub block_comments: Vec<BlockComment>,
    pub string_delimiter: Option<char>,
    pub multiline_string_delimiter: Option<String>,
    pub char_delimiter: Option<char>,
    pub escape_char: Option<char>,
    /// Introduces `$name` and `${…}` interpolation inside strings; `None` disables it
    pub interpolation_char: Option<char>,
    pub hex_prefixes: Vec<String>,
    pub bin_prefixes: Vec<String>,
    pub oct_prefixes: Vec<String>,
    /// Trailing character marking a single-precision float (`1.5f`)
    pub float_suffix: Option<char>,
    /// Trailing character marking a double explicitly (`1.5d`); unsuffixed floats are doubles
    pub double_suffix: Option<char>,
    /// Characters besides letters and `_` that may start an identifier
    pub identifier_start_extra: String,
    /// Characters besides letters, digits and `_` that may continue an identifier
    pub identifier_part_extra: String,
    pub retain_whitespace: bool,
    pub retain_comments: bool,
}

impl Default for LexerConfig {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            keywords_ci: Vec::new(),
            punctuation: Vec::new(),
            operators: Vec::new(),
            line_comments: vec!["//".to_string()],
            block_comments: vec![BlockComment::new("/*", "*/")],
            string_delimiter: Some('"'),
            multiline_string_delimiter: Some("\"\"\"".to_string()),
            char_delimiter: Some('\''),
            escape_char: Some('\\'),
            interpolation_char: Some('$'),
            hex_prefixes: vec!["0x".to_string(), "0X".to_string()],
            bin_prefixes: vec!["0b".to_string(), "0B".to_string()],
            oct_prefixes: Vec::new(),
            float_suffix: Some('f'),
            double_suffix: None,
            identifier_start_extra: String::new(),
            identifier_part_extra: String::new(),
            retain_whitespace: true,
            retain_comments: true,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

static C_LIKE: Lazy<LexerConfig> = Lazy::new(|| LexerConfig {
    keywords: strings(&[
        "fun", "val", "var", "let", "if", "else", "when", "while", "for", "in", "return",
        "break", "continue", "true", "false", "null",
    ]),
    punctuation: strings(&["(", ")", "{", "}", "[", "]", ",", ";", "."]),
    operators: strings(&[
        "+", "-", "*", "/", "%", "**", "=", "+=", "-=", "*=", "/=", "%=", "==", "!=", "<", "<=",
        ">", ">=", "<<", ">>", "&", "|", "^", "&&", "||", "!", "~", "?", ":", "?:", "++", "--",
        "->",
    ]),
    oct_prefixes: strings(&["0o", "0O"]),
    ..LexerConfig::default()
});

static ASSEMBLY: Lazy<LexerConfig> = Lazy::new(|| LexerConfig {
    keywords_ci: strings(&[
        "mov", "add", "sub", "mul", "div", "and", "or", "xor", "not", "shl", "shr", "cmp",
        "jmp", "je", "jne", "call", "ret", "push", "pop", "nop", "ld", "st", "li", "la",
    ]),
    punctuation: strings(&[",", "(", ")", "[", "]", ":"]),
    operators: strings(&["+", "-", "*", "/", "%", "<<", ">>", "&", "|", "^", "~"]),
    line_comments: strings(&[";", "#"]),
    block_comments: Vec::new(),
    multiline_string_delimiter: None,
    interpolation_char: None,
    oct_prefixes: strings(&["0o"]),
    float_suffix: None,
    identifier_start_extra: ".".to_string(),
    identifier_part_extra: ".$".to_string(),
    ..LexerConfig::default()
});

impl LexerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// C/Kotlin style preset
    pub fn c_like() -> Self {
        C_LIKE.clone()
    }

    /// Assembly dialect preset
    pub fn assembly() -> Self {
        ASSEMBLY.clone()
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    pub fn with_keywords_ci<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords_ci.extend(keywords.into_iter().map(Into::into));
        self
    }

    pub fn with_punctuation<I, S>(mut self, punctuation: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.punctuation
            .extend(punctuation.into_iter().map(Into::into));
        self
    }

    pub fn with_operators<I, S>(mut self, operators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.operators.extend(operators.into_iter().map(Into::into));
        self
    }

    pub fn with_trivia(mut self, retain_whitespace: bool, retain_comments: bool) -> Self {
        self.retain_whitespace = retain_whitespace;
        self.retain_comments = retain_comments;
        self
    }

    /// Parse a config from JSON text
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: LexerConfig = serde_json::from_str(text).map_err(ConfigError::Json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config from YAML text
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: LexerConfig = serde_yaml::from_str(text).map_err(ConfigError::Yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, choosing the format from its extension (`.json`, `.yaml`, `.yml`)
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&text),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(ConfigError::Json)
    }

    /// Check the config for entries the tokenizer cannot honor
    pub fn validate(&self) -> Result<(), ConfigError> {
        let lists = [
            ("keywords", &self.keywords),
            ("keywords_ci", &self.keywords_ci),
            ("punctuation", &self.punctuation),
            ("operators", &self.operators),
            ("line_comments", &self.line_comments),
            ("hex_prefixes", &self.hex_prefixes),
            ("bin_prefixes", &self.bin_prefixes),
            ("oct_prefixes", &self.oct_prefixes),
        ];
        for (name, list) in lists {
            if list.iter().any(|s| s.is_empty()) {
                return Err(ConfigError::Invalid(format!("{} contains an empty string", name)));
            }
        }

        for comment in &self.block_comments {
            if comment.start.is_empty() || comment.end.is_empty() {
                return Err(ConfigError::Invalid(
                    "block comment delimiters must not be empty".to_string(),
                ));
            }
        }

        // The numeric rule only triggers on a digit
        let prefixes = self
            .hex_prefixes
            .iter()
            .chain(&self.bin_prefixes)
            .chain(&self.oct_prefixes);
        for prefix in prefixes {
            if !prefix.starts_with(|c: char| c.is_ascii_digit()) {
                return Err(ConfigError::Invalid(format!(
                    "numeric prefix {:?} must start with a digit",
                    prefix
                )));
            }
        }

        let delimiters = [
            self.string_delimiter,
            self.char_delimiter,
            self.escape_char,
            self.interpolation_char,
        ];
        if delimiters.iter().flatten().any(|c| c.is_whitespace()) {
            return Err(ConfigError::Invalid(
                "delimiters and escape characters must not be whitespace".to_string(),
            ));
        }
        if self.escape_char.is_some()
            && (self.escape_char == self.string_delimiter
                || self.escape_char == self.char_delimiter)
        {
            return Err(ConfigError::Invalid(
                "escape character must differ from the string and char delimiters".to_string(),
            ));
        }
        if let Some(ml) = &self.multiline_string_delimiter {
            if ml.is_empty() || ml.chars().any(char::is_whitespace) {
                return Err(ConfigError::Invalid(
                    "multi-line string delimiter must be non-empty and contain no whitespace"
                        .to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Errors that can occur while loading or validating a configuration
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json(serde_json::Error),
    Yaml(serde_yaml::Error),
    /// The file extension does not name a supported format
    UnsupportedFormat(String),
    /// The config parsed but cannot be honored by the tokenizer
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "Cannot read config {}: {}", path.display(), source)
            }
            ConfigError::Json(e) => write!(f, "Invalid JSON config: {}", e),
            ConfigError::Yaml(e) => write!(f, "Invalid YAML config: {}", e),
            ConfigError::UnsupportedFormat(ext) => {
                write!(f, "Unsupported config format: {} (expected json, yaml or yml)", ext)
            }
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Json(e) => Some(e),
            ConfigError::Yaml(e) => Some(e),
            _ => None,
        }
    }
}

/// Match tables compiled from a [`LexerConfig`] for one tokenize call
pub(crate) struct Rules<'c> {
    pub(crate) config: &'c LexerConfig,
    /// Sorted longest-first
    pub(crate) punctuation: Vec<&'c str>,
    /// Sorted longest-first
    pub(crate) operators: Vec<&'c str>,
    pub(crate) keywords: HashSet<&'c str>,
    /// Lowercased
    pub(crate) keywords_ci: HashSet<String>,
    /// `(prefix, base)` sorted longest-first
    pub(crate) prefixes: Vec<(&'c str, IntegerBase)>,
}

fn longest_first(items: &[String]) -> Vec<&str> {
    let mut sorted: Vec<&str> = items
        .iter()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect();
    // Stable sort keeps declaration order among equal lengths
    sorted.sort_by(|a, b| b.len().cmp(&a.len()));
    sorted.dedup();
    sorted
}

impl<'c> Rules<'c> {
    pub(crate) fn compile(config: &'c LexerConfig) -> Self {
        let mut prefixes: Vec<(&str, IntegerBase)> = Vec::new();
        let groups = [
            (&config.hex_prefixes, IntegerBase::Hex),
            (&config.bin_prefixes, IntegerBase::Bin),
            (&config.oct_prefixes, IntegerBase::Oct),
        ];
        for (list, base) in groups {
            prefixes.extend(
                list.iter()
                    .filter(|p| p.starts_with(|c: char| c.is_ascii_digit()))
                    .map(|p| (p.as_str(), base)),
            );
        }
        prefixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        Self {
            config,
            punctuation: longest_first(&config.punctuation),
            operators: longest_first(&config.operators),
            keywords: config.keywords.iter().map(String::as_str).collect(),
            keywords_ci: config.keywords_ci.iter().map(|k| k.to_lowercase()).collect(),
            prefixes,
        }
    }

    /// Longest punctuation string matching at the start of `rest`
    pub(crate) fn match_punctuation(&self, rest: &str) -> Option<&'c str> {
        self.punctuation.iter().copied().find(|p| rest.starts_with(p))
    }

    /// Longest operator string matching at the start of `rest`
    pub(crate) fn match_operator(&self, rest: &str) -> Option<&'c str> {
        self.operators.iter().copied().find(|op| rest.starts_with(op))
    }

    pub(crate) fn is_keyword(&self, word: &str) -> bool {
        self.keywords.contains(word)
            || (!self.keywords_ci.is_empty() && self.keywords_ci.contains(&word.to_lowercase()))
    }

    pub(crate) fn is_identifier_start(&self, c: char) -> bool {
        c.is_alphabetic() || c == '_' || self.config.identifier_start_extra.contains(c)
    }

    pub(crate) fn is_identifier_part(&self, c: char) -> bool {
        c.is_alphanumeric() || c == '_' || self.config.identifier_part_extra.contains(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_first_ordering() {
        let config = LexerConfig::new().with_operators(["+", "+=", "=", "<<=", "<<"]);
        let rules = Rules::compile(&config);
        assert_eq!(rules.operators, vec!["<<=", "+=", "<<", "+", "="]);
        assert_eq!(rules.match_operator("+=1"), Some("+="));
        assert_eq!(rules.match_operator("<<2"), Some("<<"));
        assert_eq!(rules.match_operator("x"), None);
    }

    #[test]
    fn test_keyword_case_rules() {
        let config = LexerConfig::new()
            .with_keywords(["fun"])
            .with_keywords_ci(["MOV"]);
        let rules = Rules::compile(&config);
        assert!(rules.is_keyword("fun"));
        assert!(!rules.is_keyword("Fun"));
        assert!(rules.is_keyword("mov"));
        assert!(rules.is_keyword("MoV"));
    }

    #[test]
    fn test_validate_rejects_bad_prefix() {
        let mut config = LexerConfig::new();
        config.hex_prefixes = vec!["$".to_string()];
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_empty_operator() {
        let config = LexerConfig::new().with_operators(["+", ""]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(LexerConfig::c_like().validate().is_ok());
        assert!(LexerConfig::assembly().validate().is_ok());
        assert!(LexerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let config = LexerConfig::c_like();
        let json = config.to_json().unwrap();
        assert_eq!(LexerConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_yaml_defaults_fill_missing_fields() {
        let yaml = "keywords: [fun]\noperators: ['+', '+=']\nretain_whitespace: false\n";
        let config = LexerConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.keywords, vec!["fun"]);
        assert!(!config.retain_whitespace);
        assert!(config.retain_comments);
        assert_eq!(config.string_delimiter, Some('"'));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = LexerConfig::from_json_str(r#"{"keywrds": ["x"]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
