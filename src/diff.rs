//! Extraction of modified line ranges from unified diff output.
//!
//! Only hunk headers matter here: the content lines of a hunk never change
//! which working-tree lines were touched, so they are skipped. Each header
//! `@@ -old_start,old_count +new_start,new_count @@` yields one range in the
//! new (working-tree) numbering, and the ranges are coalesced before use.

use error_set::error_set;
use nom::{
    IResult, Parser,
    bytes::complete::tag,
    character::complete::{char, u32 as line_number},
    combinator::opt,
    sequence::{delimited, preceded, separated_pair},
};
use std::fmt;

use crate::range::{LineRange, coalesce};

error_set! {
    /// Errors from parsing unified diff text
    DiffParseError := {
        /// A line announcing a hunk did not match the hunk-header grammar
        #[display("Malformed hunk header: {header}")]
        MalformedHunkHeader { header: String },
    }
}

/// One hunk header from a unified diff.
///
/// Holds only the positional information; content lines are not retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
}

impl Hunk {
    /// Parse a `@@ -a,b +c,d @@` header line.
    ///
    /// A count defaults to 1 when omitted, so `@@ -10 +10 @@` is a
    /// single-line hunk. Section context after the closing `@@` is ignored.
    pub fn parse(header: &str) -> Result<Self, DiffParseError> {
        hunk_header(header)
            .map(|(_, hunk)| hunk)
            .map_err(|_| DiffParseError::MalformedHunkHeader {
                header: header.to_string(),
            })
    }

    /// The lines this hunk touches in the working-tree version of the file.
    ///
    /// A hunk with additions covers exactly its new-side span. A pure
    /// deletion leaves no new lines behind, so it is anchored to the single
    /// line at the deletion point so the surrounding context still gets
    /// reformatted. Either way the start is clamped to 1, line numbers being
    /// 1-indexed: a zero start only appears in well-formed diffs on the
    /// deletion side, but a degenerate header must not mint an invalid range.
    pub fn modified_range(&self) -> LineRange {
        let start = self.new_start.max(1);
        if self.new_count > 0 {
            LineRange::new(start, start + self.new_count - 1)
        } else {
            LineRange::new(start, start)
        }
    }
}

impl fmt::Display for Hunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_count, self.new_start, self.new_count
        )
    }
}

/// One side of a hunk header: `10,2` or just `10` (count defaults to 1)
fn span(input: &str) -> IResult<&str, (u32, u32)> {
    (line_number, opt(preceded(char(','), line_number)))
        .map(|(start, count)| (start, count.unwrap_or(1)))
        .parse(input)
}

fn hunk_header(input: &str) -> IResult<&str, Hunk> {
    delimited(
        tag("@@ "),
        separated_pair(
            preceded(char('-'), span),
            char(' '),
            preceded(char('+'), span),
        ),
        tag(" @@"),
    )
    .map(|((old_start, old_count), (new_start, new_count))| Hunk {
        old_start,
        old_count,
        new_start,
        new_count,
    })
    .parse(input)
}

/// Extract the coalesced set of modified line ranges from unified diff text.
///
/// An empty diff yields an empty set. Any malformed hunk header fails the
/// whole parse; the caller must leave the file untouched in that case.
pub fn modified_ranges(diff: &str) -> Result<Vec<LineRange>, DiffParseError> {
    let mut ranges = Vec::new();
    for line in diff.lines() {
        if line.starts_with("@@ ") {
            let hunk = Hunk::parse(line)?;
            log::debug!("hunk {hunk} -> {}", hunk.modified_range());
            ranges.push(hunk.modified_range());
        }
    }
    Ok(coalesce(ranges))
}
