//! Splicing corrected fragments back into the original file.
//!
//! Lines are handled as `split_inclusive('\n')` segments throughout, so every
//! untouched span is copied with its exact bytes, carriage returns and final
//! missing newline included.

use error_set::error_set;

use crate::range::LineRange;

error_set! {
    /// Invariant violations detected while reassembling a file
    MergeError := {
        /// Ranges reaching the merge were not coalesced upstream
        #[display("Ranges {first} and {second} overlap or are out of order")]
        OverlappingRanges { first: LineRange, second: LineRange },
        /// A range points past the end of the file
        #[display("Range {range} exceeds the {lines} line(s) of the file")]
        RangeOutOfBounds { range: LineRange, lines: usize },
        /// The formatting engine altered lines outside the requested range
        #[display("Formatter changed lines outside the requested range {range}")]
        ConfinementViolation { range: LineRange },
    }
}

/// Slice the replacement fragment for `range` out of a formatting engine's
/// full-file output, verifying the engine stayed inside the range.
///
/// `fixed` is expected to differ from `original` only within `range`: the
/// `range.start - 1` leading lines and the `len - range.end` trailing lines
/// must be byte-identical on both sides. Anything else means the engine broke
/// its confinement contract, which is reported rather than trusted.
pub fn extract_fragment(
    original: &str,
    fixed: &str,
    range: LineRange,
) -> Result<String, MergeError> {
    let old: Vec<&str> = original.split_inclusive('\n').collect();
    let new: Vec<&str> = fixed.split_inclusive('\n').collect();

    if range.end as usize > old.len() {
        return Err(MergeError::RangeOutOfBounds {
            range,
            lines: old.len(),
        });
    }

    let prefix = (range.start - 1) as usize;
    let suffix = old.len() - range.end as usize;

    // The engine may grow or shrink the range itself, but never eat into the
    // surrounding lines.
    if new.len() < prefix + suffix
        || old[..prefix] != new[..prefix]
        || old[old.len() - suffix..] != new[new.len() - suffix..]
    {
        return Err(MergeError::ConfinementViolation { range });
    }

    Ok(new[prefix..new.len() - suffix].concat())
}

/// Reassemble a file from its original text and replacement fragments.
///
/// `pieces` must be ordered by range start and strictly non-overlapping;
/// violating that is a programming fault upstream (the parser coalesces
/// ranges), so the merge fails fast instead of guessing a resolution.
pub fn merge(original: &str, pieces: &[(LineRange, String)]) -> Result<String, MergeError> {
    let lines: Vec<&str> = original.split_inclusive('\n').collect();

    for pair in pieces.windows(2) {
        let (first, second) = (pair[0].0, pair[1].0);
        if second.start <= first.end {
            return Err(MergeError::OverlappingRanges { first, second });
        }
    }
    if let Some(&(last, _)) = pieces.last()
        && last.end as usize > lines.len()
    {
        return Err(MergeError::RangeOutOfBounds {
            range: last,
            lines: lines.len(),
        });
    }

    let mut result = String::with_capacity(original.len());
    let mut next = 0usize; // index of the next original line to copy
    for (range, fragment) in pieces {
        for line in &lines[next..(range.start - 1) as usize] {
            result.push_str(line);
        }
        result.push_str(fragment);
        next = range.end as usize;
    }
    for line in &lines[next..] {
        result.push_str(line);
    }

    Ok(result)
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_original() -> impl Strategy<Value = String> {
        prop::collection::vec("[ -~]{0,12}", 1..20)
            .prop_map(|lines| lines.join("\n") + "\n")
    }

    proptest! {
        /// Splicing back the original lines of each range reproduces the file.
        #[test]
        fn merging_original_fragments_is_identity(original in arb_original()) {
            let lines: Vec<&str> = original.split_inclusive('\n').collect();

            // Every other line as its own single-line range, fragments taken
            // verbatim from the original.
            let pieces: Vec<(LineRange, String)> = (1..=lines.len() as u32)
                .step_by(2)
                .map(|n| (LineRange::new(n, n), lines[(n - 1) as usize].to_string()))
                .collect();

            prop_assert_eq!(merge(&original, &pieces).unwrap(), original.clone());
        }

        /// Lines outside every range survive the merge byte-for-byte, in order.
        #[test]
        fn merge_preserves_untouched_prefix_and_suffix(
            original in arb_original(),
            fragment in "[ -~]{0,12}\n",
        ) {
            let lines: Vec<&str> = original.split_inclusive('\n').collect();
            if lines.len() < 3 {
                return Ok(());
            }
            let target = LineRange::new(2, 2);
            let merged = merge(&original, &[(target, fragment.clone())]).unwrap();

            prop_assert!(merged.starts_with(lines[0]));
            let suffix: String = lines[2..].concat();
            prop_assert!(merged.ends_with(&suffix));
            prop_assert_eq!(merged, format!("{}{}{}", lines[0], fragment, suffix));
        }
    }
}
