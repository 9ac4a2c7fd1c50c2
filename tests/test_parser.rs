use skill_check::document::{Document, ParserState, FRONTMATTER_SECTION, UNKNOWN_SECTION};

const SAMPLE: &str = "---\nname: demo\ndescription: A demo skill\n---\n\nIntro line\n\n## Contents\n\nSee [guide](https://github.com/org/repo).\n\n## Instructions\n\nStep one.\n\n```bash\necho hi\n## not a heading\n```\n\nStep two.\n";

#[test]
fn parses_frontmatter_fields() {
    let doc = Document::parse(SAMPLE);
    let fm = doc.frontmatter.as_ref().expect("frontmatter");
    assert_eq!(fm.name.as_deref(), Some("demo"));
    assert_eq!(fm.description.as_deref(), Some("A demo skill"));
    assert!(fm.extra_keys.is_empty());
    assert_eq!(fm.start_line, 0);
    assert_eq!(fm.end_line, 3);
}

#[test]
fn frontmatter_requires_delimiter_on_first_line() {
    let doc = Document::parse("\n---\nname: x\n---\n");
    assert!(doc.frontmatter.is_none());
}

#[test]
fn unclosed_frontmatter_is_absent() {
    let doc = Document::parse("---\nname: x\n\n## Instructions\n");
    assert!(doc.frontmatter.is_none());
}

#[test]
fn frontmatter_collects_extra_keys_and_blank_values() {
    let doc = Document::parse("---\nname:\ndescription: d\nauthor: me\n: nokey\nnot a pair\n---\n");
    let fm = doc.frontmatter.unwrap();
    assert_eq!(fm.name, None);
    assert_eq!(fm.description.as_deref(), Some("d"));
    assert_eq!(fm.extra_keys, vec!["author".to_string()]);
}

#[test]
fn headings_open_sections_and_code_is_excluded_from_content() {
    let doc = Document::parse(SAMPLE);
    assert_eq!(doc.section_titles(), vec!["Contents", "Instructions"]);

    let instructions = doc.instructions().unwrap();
    assert_eq!(instructions.level, 2);
    assert_eq!(instructions.start_line, 11);
    assert!(instructions.content.contains("Step one."));
    assert!(instructions.content.contains("Step two."));
    assert!(!instructions.content.contains("echo hi"));
}

#[test]
fn sections_end_before_next_heading_and_at_last_line() {
    let doc = Document::parse(SAMPLE);
    let contents = &doc.sections[0];
    let instructions = &doc.sections[1];
    assert_eq!(contents.end_line, instructions.start_line - 1);
    assert_eq!(instructions.end_line, doc.line_count() - 1);
}

#[test]
fn headings_inside_fences_are_not_sections() {
    let doc = Document::parse(SAMPLE);
    assert!(!doc.section_titles().iter().any(|t| t.contains("not a heading")));
}

#[test]
fn level_three_headings_are_content() {
    let doc = Document::parse("## Instructions\n### Detail\ntext\n");
    assert_eq!(doc.sections.len(), 1);
    assert!(doc.sections[0].content.contains("### Detail"));
}

#[test]
fn code_blocks_record_language_section_and_fences() {
    let doc = Document::parse(SAMPLE);
    assert_eq!(doc.code_blocks.len(), 1);
    let block = &doc.code_blocks[0];
    assert_eq!(block.language, "bash");
    assert_eq!(block.section.as_deref(), Some("Instructions"));
    assert_eq!(block.content, "echo hi\n## not a heading");
    assert!(doc.is_in_code_block(block.start_line));
    assert!(doc.is_in_code_block(block.end_line));
    assert!(!doc.is_in_code_block(block.end_line + 1));
    assert_eq!(doc.code_blocks_in_section("instructions").len(), 1);
}

#[test]
fn unterminated_fence_is_dropped() {
    let doc = Document::parse("## Instructions\n```\nrm -rf /\n");
    assert!(doc.code_blocks.is_empty());
    assert!(!doc.is_in_code_block(2));
}

#[test]
fn links_carry_section_and_zero_based_line() {
    let doc = Document::parse(SAMPLE);
    assert_eq!(doc.links.len(), 1);
    let link = &doc.links[0];
    assert_eq!(link.text, "guide");
    assert_eq!(link.url, "https://github.com/org/repo");
    assert_eq!(link.section, "Contents");
    assert_eq!(link.line, 9);
    assert!(!link.is_image);
}

#[test]
fn image_links_and_links_before_any_heading() {
    let doc = Document::parse("![logo](https://example.com/logo.png)\n");
    assert_eq!(doc.links.len(), 1);
    assert!(doc.links[0].is_image);
    assert_eq!(doc.links[0].section, UNKNOWN_SECTION);
}

#[test]
fn links_inside_code_blocks_are_ignored() {
    let doc = Document::parse("```\n[x](https://evil.example)\n```\n");
    assert!(doc.links.is_empty());
}

#[test]
fn section_for_line_partitions_the_document() {
    let doc = Document::parse(SAMPLE);
    assert_eq!(doc.section_for_line(0), FRONTMATTER_SECTION);
    assert_eq!(doc.section_for_line(3), FRONTMATTER_SECTION);
    assert_eq!(doc.section_for_line(5), UNKNOWN_SECTION);
    assert_eq!(doc.section_for_line(7), "Contents");
    assert_eq!(doc.section_for_line(16), "Instructions");
}

#[test]
fn first_line_without_frontmatter_is_not_frontmatter() {
    let doc = Document::parse("plain text\n## Instructions\n");
    assert_eq!(doc.section_for_line(0), UNKNOWN_SECTION);
}

#[test]
fn empty_input_parses_to_single_empty_line() {
    let doc = Document::parse("");
    assert_eq!(doc.line_count(), 1);
    assert!(doc.frontmatter.is_none());
    assert!(doc.sections.is_empty());
}

#[test]
fn heading_titles_are_trimmed() {
    let doc = Document::parse("## Instructions   \nbody\n");
    assert_eq!(doc.sections[0].title, "Instructions");
    assert!(doc.find_section("INSTRUCTIONS").is_some());
}

#[test]
fn parser_state_tracks_section_and_fence_independently() {
    let mut doc = Document::default();
    let mut state = ParserState::with_frontmatter(1);
    state.step(0, "---", &mut doc);
    assert!(!state.frontmatter_consumed());
    state.step(1, "---", &mut doc);
    assert!(state.frontmatter_consumed());
    assert_eq!(state.open_section(), None);

    state.step(2, "## Setup", &mut doc);
    assert_eq!(state.open_section(), Some("Setup"));
    assert!(!state.in_fence());

    state.step(3, "```sh", &mut doc);
    assert!(state.in_fence());
    state.step(4, "# inside", &mut doc);
    assert_eq!(state.open_section(), Some("Setup"));
    state.step(5, "```", &mut doc);
    assert!(!state.in_fence());
    assert_eq!(doc.code_blocks.len(), 1);
    assert_eq!(doc.code_blocks[0].end_line, 5);

    state.finish(5, &mut doc);
    assert_eq!(doc.sections.len(), 1);
    assert_eq!(doc.sections[0].end_line, 5);
    assert!(doc.sections[0].content.is_empty());
}

#[test]
fn parser_state_skips_frontmatter_lines_until_consumed() {
    let mut doc = Document::default();
    let mut state = ParserState::with_frontmatter(2);
    state.step(0, "---", &mut doc);
    state.step(1, "# not a heading [x](https://a.example)", &mut doc);
    assert!(!state.frontmatter_consumed());
    state.step(2, "---", &mut doc);
    state.finish(2, &mut doc);
    assert!(doc.sections.is_empty());
    assert!(doc.links.is_empty());
}

#[test]
fn parser_state_without_frontmatter_consumes_on_first_line() {
    let mut doc = Document::default();
    let mut state = ParserState::new();
    assert!(!state.frontmatter_consumed());
    state.step(0, "# Title", &mut doc);
    assert!(state.frontmatter_consumed());
    assert_eq!(state.open_section(), Some("Title"));
}

#[test]
fn leading_byte_order_mark_does_not_hide_frontmatter() {
    let doc = Document::parse("\u{FEFF}---\nname: demo\ndescription: d\n---\n## Instructions\n");
    let fm = doc.frontmatter.as_ref().expect("frontmatter");
    assert_eq!(fm.name.as_deref(), Some("demo"));
    assert_eq!(fm.end_line, 3);
    assert_eq!(doc.section_titles(), vec!["Instructions"]);
}
