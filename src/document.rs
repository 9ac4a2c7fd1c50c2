//! `SKILL.md` parser and positional document model.
//!
//! [`Document::parse`] makes a single forward pass over the raw lines and
//! records the frontmatter block, level-1/2 sections, fenced code blocks, and
//! links, each tagged with 0-based line positions. Parsing never fails:
//! malformed input degrades to partial structure, and the detection layers
//! report what is missing.
//!
//! # Frontmatter
//!
//! Only a flat `key: value` scan is performed, not YAML. The block must start
//! on line 0 (a leading byte-order mark is ignored) and is closed by the next
//! `---` line. An unterminated block is treated as absent.

use regex::Regex;
use std::sync::LazyLock;

static RE_HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{1,2})\s+(.+)$").unwrap());

static RE_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^```(\w*)\s*$").unwrap());

static RE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(!?)\[([^\]]*)\]\(([^)]+)\)").unwrap());

/// Section name reported for lines inside the frontmatter block.
pub const FRONTMATTER_SECTION: &str = "frontmatter";

/// Section name reported for lines not covered by any section.
pub const UNKNOWN_SECTION: &str = "unknown";

const DELIMITER: &str = "---";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontmatter {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Keys other than `name` and `description`, in file order.
    pub extra_keys: Vec<String>,
    /// Line of the opening delimiter (always 0).
    pub start_line: usize,
    /// Line of the closing delimiter.
    pub end_line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    /// 1 for `#`, 2 for `##`.
    pub level: usize,
    /// Line of the heading.
    pub start_line: usize,
    /// Last line before the next heading, or the last line of the document.
    pub end_line: usize,
    /// Text of the section body, excluding fenced code.
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: String,
    pub content: String,
    /// Title of the section open when the fence opened.
    pub section: Option<String>,
    /// Line of the opening fence.
    pub start_line: usize,
    /// Line of the closing fence.
    pub end_line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub text: String,
    pub url: String,
    pub is_image: bool,
    /// Title of the enclosing section, or [`UNKNOWN_SECTION`].
    pub section: String,
    pub line: usize,
}

/// Parsed, immutable view of a skill document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Raw lines, split on `\n`.
    pub lines: Vec<String>,
    pub frontmatter: Option<Frontmatter>,
    pub sections: Vec<Section>,
    pub code_blocks: Vec<CodeBlock>,
    pub links: Vec<Link>,
}

/// Cursor state of the forward pass: the open section, the open fence, and
/// whether frontmatter has been consumed. Each is independent of the others.
///
/// Until the frontmatter is consumed, lines up to its closing delimiter are
/// skipped; heading, fence and link scanning start on the line after.
#[derive(Debug, Default)]
pub struct ParserState {
    section: Option<Section>,
    fence: Option<CodeBlock>,
    frontmatter_end: Option<usize>,
    frontmatter_consumed: bool,
}

impl ParserState {
    /// State for a document without frontmatter.
    pub fn new() -> Self {
        Self::default()
    }

    /// State for a document whose frontmatter closes on `end_line`.
    pub fn with_frontmatter(end_line: usize) -> Self {
        ParserState {
            frontmatter_end: Some(end_line),
            ..Self::default()
        }
    }

    pub fn in_fence(&self) -> bool {
        self.fence.is_some()
    }

    pub fn open_section(&self) -> Option<&str> {
        self.section.as_ref().map(|s| s.title.as_str())
    }

    pub fn frontmatter_consumed(&self) -> bool {
        self.frontmatter_consumed
    }

    /// Feeds one line into the state machine.
    pub fn step(&mut self, idx: usize, line: &str, doc: &mut Document) {
        if !self.frontmatter_consumed {
            match self.frontmatter_end {
                Some(end) if idx < end => return,
                Some(end) if idx == end => {
                    self.frontmatter_consumed = true;
                    return;
                }
                _ => self.frontmatter_consumed = true,
            }
        }

        if let Some(caps) = RE_FENCE.captures(line) {
            match self.fence.take() {
                Some(mut block) => {
                    block.end_line = idx;
                    doc.code_blocks.push(block);
                }
                None => {
                    self.fence = Some(CodeBlock {
                        language: caps[1].to_string(),
                        content: String::new(),
                        section: self.open_section().map(str::to_string),
                        start_line: idx,
                        end_line: idx,
                    });
                }
            }
            return;
        }

        if let Some(block) = self.fence.as_mut() {
            push_line(&mut block.content, line);
            return;
        }

        if let Some(caps) = RE_HEADING.captures(line) {
            self.close_section(idx.saturating_sub(1), doc);
            self.section = Some(Section {
                title: caps[2].trim_end().to_string(),
                level: caps[1].len(),
                start_line: idx,
                end_line: idx,
                content: String::new(),
            });
            return;
        }

        if let Some(section) = self.section.as_mut() {
            push_line(&mut section.content, line);
        }

        let section = self.open_section().unwrap_or(UNKNOWN_SECTION);
        for caps in RE_LINK.captures_iter(line) {
            doc.links.push(Link {
                text: caps[2].to_string(),
                url: caps[3].to_string(),
                is_image: &caps[1] == "!",
                section: section.to_string(),
                line: idx,
            });
        }
    }

    /// Closes any open section at `last_line` and drops an unterminated fence.
    pub fn finish(mut self, last_line: usize, doc: &mut Document) {
        self.close_section(last_line, doc);
        // An unterminated fence is not recorded: its lines stay subject to
        // the checks that skip code blocks.
        self.fence = None;
    }

    fn close_section(&mut self, end_line: usize, doc: &mut Document) {
        if let Some(mut section) = self.section.take() {
            section.end_line = end_line;
            doc.sections.push(section);
        }
    }
}

fn push_line(buf: &mut String, line: &str) {
    if !buf.is_empty() {
        buf.push('\n');
    }
    buf.push_str(line);
}

/// Reads the frontmatter block starting at line 0, if present and closed.
fn parse_frontmatter(lines: &[String]) -> Option<Frontmatter> {
    if lines.first()?.trim_start_matches('\u{FEFF}').trim() != DELIMITER {
        return None;
    }
    let end_line = lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, l)| l.trim() == DELIMITER)
        .map(|(i, _)| i)?;

    let mut fm = Frontmatter {
        start_line: 0,
        end_line,
        ..Frontmatter::default()
    };

    for line in &lines[1..end_line] {
        let Some((key, value)) = line.trim().split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() {
            continue;
        }
        match key {
            "name" => fm.name = Some(value.to_string()).filter(|v| !v.is_empty()),
            "description" => fm.description = Some(value.to_string()).filter(|v| !v.is_empty()),
            _ => fm.extra_keys.push(key.to_string()),
        }
    }

    Some(fm)
}

impl Document {
    /// Parses raw text into a document model. Never fails.
    pub fn parse(content: &str) -> Document {
        let lines: Vec<String> = content.split('\n').map(str::to_string).collect();
        let mut doc = Document {
            frontmatter: parse_frontmatter(&lines),
            ..Document::default()
        };

        let mut state = match &doc.frontmatter {
            Some(fm) => ParserState::with_frontmatter(fm.end_line),
            None => ParserState::new(),
        };

        for (idx, line) in lines.iter().enumerate() {
            state.step(idx, line, &mut doc);
        }
        state.finish(lines.len().saturating_sub(1), &mut doc);

        doc.lines = lines;
        doc
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn section_titles(&self) -> Vec<String> {
        self.sections.iter().map(|s| s.title.clone()).collect()
    }

    /// First section whose title equals `title`, ignoring case.
    pub fn find_section(&self, title: &str) -> Option<&Section> {
        let lower = title.to_lowercase();
        self.sections
            .iter()
            .find(|s| s.title.to_lowercase() == lower)
    }

    pub fn instructions(&self) -> Option<&Section> {
        self.find_section("Instructions")
    }

    /// Name of the region containing 0-based line `line`: `"frontmatter"`, a
    /// section title, or `"unknown"`.
    pub fn section_for_line(&self, line: usize) -> &str {
        if let Some(fm) = &self.frontmatter {
            if line >= fm.start_line && line <= fm.end_line {
                return FRONTMATTER_SECTION;
            }
        }
        self.sections
            .iter()
            .find(|s| line >= s.start_line && line <= s.end_line)
            .map_or(UNKNOWN_SECTION, |s| s.title.as_str())
    }

    /// Returns `true` if `line` falls within a code block, fences included.
    pub fn is_in_code_block(&self, line: usize) -> bool {
        self.code_block_at(line).is_some()
    }

    pub fn code_block_at(&self, line: usize) -> Option<&CodeBlock> {
        self.code_blocks
            .iter()
            .find(|cb| line >= cb.start_line && line <= cb.end_line)
    }

    /// Code blocks opened while the named section was open, ignoring case.
    pub fn code_blocks_in_section(&self, title: &str) -> Vec<&CodeBlock> {
        let lower = title.to_lowercase();
        self.code_blocks
            .iter()
            .filter(|cb| {
                cb.section
                    .as_deref()
                    .is_some_and(|s| s.to_lowercase() == lower)
            })
            .collect()
    }

    /// Raw lines covered by `section`, heading and code included.
    pub fn section_lines(&self, section: &Section) -> &[String] {
        let end = (section.end_line + 1).min(self.lines.len());
        let start = section.start_line.min(end);
        &self.lines[start..end]
    }
}
