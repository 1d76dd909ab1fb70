//! Terminator-preserving line sequences.
//!
//! Every line keeps its own terminator (`\n`, `\r\n`, or nothing for an
//! unterminated final line), so joining the lines reproduces the input byte
//! for byte.

use crate::locate::Span;

/// Line-ending convention of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    /// Detect the convention from the first terminator in `text`.
    ///
    /// Text without any newline is treated as `Lf`.
    pub fn detect(text: &str) -> Self {
        match text.find('\n') {
            Some(pos) if text[..pos].ends_with('\r') => LineEnding::CrLf,
            _ => LineEnding::Lf,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Split `text` into lines, each retaining its terminator.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_owned).collect()
}

/// Concatenate lines back into a single string.
pub fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let mut out = String::with_capacity(lines.iter().map(|l| l.as_ref().len()).sum());
    for line in lines {
        out.push_str(line.as_ref());
    }
    out
}

/// Line text with its terminator removed.
pub fn strip_terminator(line: &str) -> &str {
    line.strip_suffix("\r\n")
        .or_else(|| line.strip_suffix('\n'))
        .unwrap_or(line)
}

/// An in-memory file: its lines and the line-ending convention they use.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineSequence {
    lines: Vec<String>,
    ending: LineEnding,
}

impl LineSequence {
    pub fn parse(text: &str) -> Self {
        Self {
            lines: split_lines(text),
            ending: LineEnding::detect(text),
        }
    }

    pub fn from_lines(lines: Vec<String>, ending: LineEnding) -> Self {
        Self { lines, ending }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn ending(&self) -> LineEnding {
        self.ending
    }

    pub fn to_text(&self) -> String {
        join_lines(&self.lines)
    }

    /// Text of the lines covered by `span`, terminators included.
    ///
    /// Out-of-range bounds are clamped to the sequence.
    pub fn text_of(&self, span: Span) -> String {
        let end = span.end.min(self.lines.len());
        let start = span.start.min(end);
        join_lines(&self.lines[start..end])
    }

    /// Split replacement text into lines that fit in place of `span`.
    ///
    /// Every terminator is rewritten to the file's convention: `\n` becomes
    /// `\r\n` in a CRLF file and `\r\n` becomes `\n` in an LF file. An
    /// unterminated final line gets the file's terminator, unless `span`
    /// itself ran to an unterminated end of file. Empty text yields no lines.
    pub fn conform(&self, text: &str, span: Span) -> Vec<String> {
        let mut lines = split_lines(text);

        for line in &mut lines {
            if line.ends_with('\n') {
                let content_len = strip_terminator(line).len();
                line.truncate(content_len);
                line.push_str(self.ending.as_str());
            }
        }

        let terminate_last = span.end < self.lines.len()
            || self.lines[..span.end.min(self.lines.len())]
                .last()
                .map_or(true, |line| line.ends_with('\n'));

        if terminate_last {
            if let Some(last) = lines.last_mut() {
                if !last.ends_with('\n') {
                    last.push_str(self.ending.as_str());
                }
            }
        }

        lines
    }
}
