//! Sliding view over a line stream with one line of context on each side.
//!
//! The tracker needs exactly one line of lookbehind (tool → LLM correlation)
//! and one line of lookahead (method-2 discard signal). [`LineWindow`] holds
//! just those three lines, so input can come from any iterator rather than a
//! materialized array.

use std::iter::Fuse;

/// The current line with its immediate neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// 1-based physical line number of `current`.
    pub number: usize,
    pub previous: Option<&'a str>,
    pub current: &'a str,
    pub next: Option<&'a str>,
}

/// Lending cursor over a line iterator.
#[derive(Debug)]
pub struct LineWindow<I: Iterator<Item = String>> {
    lines: Fuse<I>,
    previous: Option<String>,
    current: Option<String>,
    next: Option<String>,
    number: usize,
    primed: bool,
}

impl<I: Iterator<Item = String>> LineWindow<I> {
    pub fn new(lines: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            lines: lines.into_iter().fuse(),
            previous: None,
            current: None,
            next: None,
            number: 0,
            primed: false,
        }
    }

    /// Moves to the next line. Returns `None` once the input is exhausted.
    pub fn advance(&mut self) -> Option<Frame<'_>> {
        if self.primed {
            self.previous = self.current.take();
            self.current = self.next.take();
        } else {
            self.primed = true;
            self.current = self.lines.next();
        }
        self.next = self.lines.next();

        if self.current.is_none() {
            return None;
        }
        self.number += 1;

        Some(Frame {
            number: self.number,
            previous: self.previous.as_deref(),
            current: self.current.as_deref()?,
            next: self.next.as_deref(),
        })
    }
}
