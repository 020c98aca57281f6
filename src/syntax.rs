use crossterm::style::Color;
use regex::Regex;
use std::ops::Range;
use std::path::Path;
use std::rc::Rc;

/// Named highlight categories. `Search` is the transient override used for
/// search-result emphasis; it always beats grammar colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HighlightGroup {
    #[default]
    Normal,
    Comment,
    String,
    Number,
    Keyword,
    Type,
    Identifier,
    Special,
    Search,
}

impl HighlightGroup {
    /// Display color for this group. `None` means the terminal default.
    /// `Search` also returns `None`: renderers draw it reverse-video.
    pub fn color(self) -> Option<Color> {
        match self {
            HighlightGroup::Comment => Some(Color::Blue),
            HighlightGroup::String | HighlightGroup::Number => Some(Color::Red),
            HighlightGroup::Keyword => Some(Color::Magenta),
            HighlightGroup::Type => Some(Color::Green),
            HighlightGroup::Identifier => Some(Color::Cyan),
            HighlightGroup::Special => Some(Color::Yellow),
            HighlightGroup::Normal | HighlightGroup::Search => None,
        }
    }

    pub fn is_override(self) -> bool {
        matches!(self, HighlightGroup::Search)
    }
}

/// Opaque per-line lexer state: which multi-line region (by grammar rule
/// index) is still open at the end of the line, if any. Equality of two
/// states is what lets the state pass stop at a fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LexState(pub(crate) Option<usize>);

/// A line tokenizer: given a line's render text and the state left by the
/// previous line, produce the state at end of line plus the matched spans
/// (byte ranges into the render text).
pub trait Tokenizer {
    fn tokenize_line(
        &self,
        text: &str,
        incoming: LexState,
    ) -> (LexState, Vec<(Range<usize>, HighlightGroup)>);
}

struct RegionRule {
    start: Regex,
    end: Regex,
    group: HighlightGroup,
}

/// A regex-driven grammar for one file type: single-line patterns, multi-line
/// region rules (block comments and the like), and detection rules keyed on
/// filename or first-line content.
pub struct Grammar {
    name: String,
    file_pattern: Regex,
    header_pattern: Option<Regex>,
    patterns: Vec<(Regex, HighlightGroup)>,
    regions: Vec<RegionRule>,
}

impl Grammar {
    pub fn new(name: &str, file_pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            file_pattern: Regex::new(file_pattern).expect("valid file pattern"),
            header_pattern: None,
            patterns: Vec::new(),
            regions: Vec::new(),
        }
    }

    /// Detection rule matched against the first line of the document, used
    /// when the filename is absent or unrecognized (shebangs, mostly).
    pub fn header(mut self, pattern: &str) -> Self {
        self.header_pattern = Some(Regex::new(pattern).expect("valid header pattern"));
        self
    }

    /// Single-line pattern. Earlier patterns win where matches overlap.
    pub fn pattern(mut self, pattern: &str, group: HighlightGroup) -> Self {
        self.patterns
            .push((Regex::new(pattern).expect("valid pattern"), group));
        self
    }

    /// Multi-line region rule; the open region is carried across lines in
    /// the lexer state.
    pub fn region(mut self, start: &str, end: &str, group: HighlightGroup) -> Self {
        self.regions.push(RegionRule {
            start: Regex::new(start).expect("valid region start"),
            end: Regex::new(end).expect("valid region end"),
            group,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn pattern_spans(
        &self,
        slice: &str,
        offset: usize,
        out: &mut Vec<(Range<usize>, HighlightGroup)>,
    ) {
        let mut claimed: Vec<Range<usize>> = Vec::new();
        for (re, group) in &self.patterns {
            for m in re.find_iter(slice) {
                if m.start() == m.end() {
                    continue;
                }
                let range = m.start()..m.end();
                if claimed
                    .iter()
                    .any(|c| c.start < range.end && range.start < c.end)
                {
                    continue;
                }
                out.push((offset + range.start..offset + range.end, *group));
                claimed.push(range);
            }
        }
    }
}

impl Tokenizer for Grammar {
    fn tokenize_line(
        &self,
        text: &str,
        incoming: LexState,
    ) -> (LexState, Vec<(Range<usize>, HighlightGroup)>) {
        let mut spans = Vec::new();
        let mut pos = 0;

        // Resume a region left open by the previous line.
        if let Some(r) = incoming.0 {
            match self.regions.get(r) {
                None => {}
                Some(rule) => match rule.end.find(text) {
                    Some(m) => {
                        spans.push((0..m.end(), rule.group));
                        pos = m.end();
                    }
                    None => {
                        spans.push((0..text.len(), rule.group));
                        return (incoming, spans);
                    }
                },
            }
        }

        loop {
            let opener = self
                .regions
                .iter()
                .enumerate()
                .filter_map(|(i, rule)| {
                    rule.start
                        .find(&text[pos..])
                        .map(|m| (pos + m.start(), pos + m.end(), i))
                })
                .min_by_key(|&(start, _, _)| start);
            match opener {
                Some((start, open_end, i)) => {
                    self.pattern_spans(&text[pos..start], pos, &mut spans);
                    let rule = &self.regions[i];
                    match rule.end.find(&text[open_end..]) {
                        Some(m) => {
                            // Region opens and closes on this line.
                            spans.push((start..open_end + m.end(), rule.group));
                            pos = open_end + m.end();
                        }
                        None => {
                            spans.push((start..text.len(), rule.group));
                            return (LexState(Some(i)), spans);
                        }
                    }
                }
                None => {
                    self.pattern_spans(&text[pos..], pos, &mut spans);
                    return (LexState::default(), spans);
                }
            }
        }
    }
}

/// Ordered set of grammars with filename/content detection, resolved once
/// when a document is opened.
pub struct SyntaxRegistry {
    grammars: Vec<Rc<Grammar>>,
}

impl SyntaxRegistry {
    pub fn new() -> Self {
        Self {
            grammars: Vec::new(),
        }
    }

    /// Registry preloaded with the built-in grammars.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(rust_grammar());
        registry.register(shell_grammar());
        registry
    }

    pub fn register(&mut self, grammar: Grammar) {
        self.grammars.push(Rc::new(grammar));
    }

    /// Resolve a grammar for a document. Filename rules are tried first,
    /// then first-line content rules.
    pub fn detect(&self, filename: Option<&Path>, first_line: &str) -> Option<Rc<Grammar>> {
        if let Some(name) = filename.and_then(|p| p.file_name()).and_then(|n| n.to_str()) {
            for grammar in &self.grammars {
                if grammar.file_pattern.is_match(name) {
                    return Some(grammar.clone());
                }
            }
        }
        for grammar in &self.grammars {
            if let Some(header) = &grammar.header_pattern {
                if header.is_match(first_line) {
                    return Some(grammar.clone());
                }
            }
        }
        None
    }
}

impl Default for SyntaxRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

pub fn rust_grammar() -> Grammar {
    use HighlightGroup::*;
    Grammar::new("rust", r"\.rs$")
        .pattern(r#""([^"\\]|\\.)*""#, String)
        .pattern(r"//.*", Comment)
        .pattern(r"#!?\[[^\]]*\]", Special)
        .pattern(r"'([^'\\]|\\.)'", String)
        .pattern(r"\b[0-9][0-9_]*(\.[0-9]+)?\b", Number)
        .pattern(
            r"\b(as|break|const|continue|crate|dyn|else|enum|extern|fn|for|if|impl|in|let|loop|match|mod|move|mut|pub|ref|return|self|Self|static|struct|super|trait|type|unsafe|use|where|while)\b",
            Keyword,
        )
        .pattern(
            r"\b(bool|char|str|String|u8|u16|u32|u64|u128|usize|i8|i16|i32|i64|i128|isize|f32|f64|Vec|Option|Result|Box|Rc|Arc)\b",
            Type,
        )
        .region(r"/\*", r"\*/", Comment)
}

pub fn shell_grammar() -> Grammar {
    use HighlightGroup::*;
    Grammar::new("shell", r"\.(sh|bash)$")
        .header(r"^#!\s*\S*\b(ba|da|k|z)?sh\b")
        .pattern(r#""([^"\\]|\\.)*""#, String)
        .pattern(r"'[^']*'", String)
        .pattern(r"#.*", Comment)
        .pattern(r"\$\{?[A-Za-z_][A-Za-z0-9_]*\}?", Identifier)
        .pattern(
            r"\b(if|then|else|elif|fi|for|in|do|done|while|until|case|esac|function|return|local|export|echo|exit)\b",
            Keyword,
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    fn group_at(spans: &[(Range<usize>, HighlightGroup)], col: usize) -> HighlightGroup {
        spans
            .iter()
            .find(|(r, _)| r.start <= col && col < r.end)
            .map(|(_, g)| *g)
            .unwrap_or(HighlightGroup::Normal)
    }

    #[test]
    fn test_rust_patterns() {
        let grammar = rust_grammar();
        let (state, spans) = grammar.tokenize_line("let x = \"hi\"; // done", LexState::default());
        assert_eq!(state, LexState::default());
        assert_eq!(group_at(&spans, 0), HighlightGroup::Keyword);
        assert_eq!(group_at(&spans, 9), HighlightGroup::String);
        assert_eq!(group_at(&spans, 15), HighlightGroup::Comment);
    }

    #[test]
    fn test_keyword_inside_string_not_highlighted() {
        let grammar = rust_grammar();
        let (_, spans) = grammar.tokenize_line("\"let\"", LexState::default());
        assert_eq!(group_at(&spans, 1), HighlightGroup::String);
    }

    #[test]
    fn test_block_comment_opens_region() {
        let grammar = rust_grammar();
        let (state, spans) = grammar.tokenize_line("let a = 1; /* open", LexState::default());
        assert_ne!(state, LexState::default());
        assert_eq!(group_at(&spans, 12), HighlightGroup::Comment);

        // The next line resumes inside the comment and closes it.
        let (state, spans) = grammar.tokenize_line("still */ let b = 2;", state);
        assert_eq!(state, LexState::default());
        assert_eq!(group_at(&spans, 3), HighlightGroup::Comment);
        assert_eq!(group_at(&spans, 9), HighlightGroup::Keyword);
    }

    #[test]
    fn test_block_comment_single_line() {
        let grammar = rust_grammar();
        let (state, spans) = grammar.tokenize_line("a /* mid */ b", LexState::default());
        assert_eq!(state, LexState::default());
        assert_eq!(group_at(&spans, 5), HighlightGroup::Comment);
        assert_eq!(group_at(&spans, 12), HighlightGroup::Normal);
    }

    #[test]
    fn test_detect_by_filename() {
        let registry = SyntaxRegistry::builtin();
        let grammar = registry
            .detect(Some(Path::new("src/main.rs")), "")
            .unwrap();
        assert_eq!(grammar.name(), "rust");
    }

    #[test]
    fn test_detect_by_shebang() {
        let registry = SyntaxRegistry::builtin();
        let grammar = registry.detect(None, "#!/bin/sh").unwrap();
        assert_eq!(grammar.name(), "shell");
        assert!(registry.detect(None, "plain text").is_none());
    }

    #[test]
    fn test_shell_patterns() {
        let grammar = shell_grammar();
        let (_, spans) = grammar.tokenize_line("echo \"$HOME\" # done", LexState::default());
        assert_eq!(group_at(&spans, 0), HighlightGroup::Keyword);
        assert_eq!(group_at(&spans, 6), HighlightGroup::String);
        assert_eq!(group_at(&spans, 13), HighlightGroup::Comment);
    }

    #[test]
    fn test_override_group_properties() {
        assert!(HighlightGroup::Search.is_override());
        assert!(!HighlightGroup::Comment.is_override());
        assert_eq!(HighlightGroup::Normal.color(), None);
        assert!(HighlightGroup::Keyword.color().is_some());
    }
}
