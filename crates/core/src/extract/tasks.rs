//! Checkbox list items and their parent chain.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::cursor::{ExclusionZones, lines};
use crate::types::{CodeSpan, Header, Span, Task, TaskParent};

static TASK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([ \t]*)(?:[-*+]|\d{1,9}[.)])[ \t]+\[([ xX])\](?:[ \t]|$)").unwrap());

/// Collect tasks top to bottom, linking each to its parent.
///
/// A task's parent is the latest task at the nearest lower indent level,
/// else the latest heading, else nothing.
pub fn extract(source: &str, headers: &[Header], code: &[CodeSpan]) -> Vec<Task> {
    let blocks = ExclusionZones::code_blocks(code);
    let mut tasks = Vec::new();
    let mut pending_headers = headers.iter().peekable();
    let mut last_header: Option<&Header> = None;
    let mut open: BTreeMap<usize, Task> = BTreeMap::new();

    for line in lines(source) {
        while let Some(header) = pending_headers.next_if(|h| h.span.index <= line.offset) {
            last_header = Some(header);
        }

        let Some(caps) = TASK_RE.captures(line.text) else {
            continue;
        };
        if blocks.contains(line.offset) {
            continue;
        }

        let indent_level = indent_width(&caps[1]) / 2;
        let parent = open
            .range(..indent_level)
            .next_back()
            .map(|(_, task)| TaskParent::Task(task.clone()))
            .or_else(|| last_header.cloned().map(TaskParent::Header))
            .map(Box::new);

        let task = Task {
            span: Span::of(source, line.offset, line.text.len()),
            line: line.number,
            completed: caps[2].eq_ignore_ascii_case("x"),
            indent_level,
            parent,
        };
        open.retain(|&level, _| level < indent_level);
        open.insert(indent_level, task.clone());
        tasks.push(task);
    }

    tasks
}

/// Whitespace width with tabs counted as two spaces.
fn indent_width(indent: &str) -> usize {
    indent.chars().map(|c| if c == '\t' { 2 } else { 1 }).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(source: &str, index: usize, length: usize, line: usize) -> Header {
        Header {
            span: Span::of(source, index, length),
            line,
            text: source[index + 2..index + length].to_string(),
            level: 1,
        }
    }

    #[test]
    fn parent_chain_follows_indentation() {
        let source = "# H\n- [ ] T1\n  - [x] T2\n";
        let h = header(source, 0, 3, 0);
        let tasks = extract(source, std::slice::from_ref(&h), &[]);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].parent_header(), Some(&h));
        assert_eq!(tasks[1].indent_level, 1);
        assert!(tasks[1].completed);
        assert_eq!(tasks[1].parent_task().map(|t| t.span.content.as_str()), Some("- [ ] T1"));
    }

    #[test]
    fn task_without_header_has_no_parent() {
        let tasks = extract("- [ ] alone", &[], &[]);
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].parent.is_none());
        assert!(!tasks[0].completed);
    }

    #[test]
    fn nearest_lower_level_wins_after_dedent() {
        let source = "- [ ] a\n    - [ ] b\n- [ ] c\n      - [ ] d\n";
        let tasks = extract(source, &[], &[]);
        let parent_of = |i: usize| tasks[i].parent_task().map(|t| t.span.content.clone());
        assert_eq!(parent_of(1).as_deref(), Some("- [ ] a"));
        assert_eq!(parent_of(3).as_deref(), Some("- [ ] c"));
        assert_eq!(tasks[3].indent_level, 3);
    }

    #[test]
    fn lower_task_before_heading_stays_parent() {
        let source = "- [ ] a\n# H\n  - [ ] b\n- [ ] c\n";
        let h = header(source, 8, 3, 1);
        let tasks = extract(source, std::slice::from_ref(&h), &[]);
        assert_eq!(
            tasks[1].parent_task().map(|t| t.span.content.as_str()),
            Some("- [ ] a")
        );
        assert_eq!(tasks[2].parent_header(), Some(&h));
    }

    #[test]
    fn ordered_markers_and_tabs() {
        let source = "1. [X] first\n\t2) [ ] second";
        let tasks = extract(source, &[], &[]);
        assert_eq!(tasks.len(), 2);
        assert!(tasks[0].completed);
        assert_eq!(tasks[1].indent_level, 1);
        assert_eq!(tasks[1].span.content, "\t2) [ ] second");
    }

    #[test]
    fn plain_list_items_and_links_are_not_tasks() {
        assert!(extract("- item\n- [link](/x)\n- [ ]tight", &[], &[]).is_empty());
    }
}
