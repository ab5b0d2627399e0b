//! Line-mode framing for inbound device data.

/// Frames a raw chunk by lines: split on newline, trim each segment, drop
/// empty segments, rejoin with newline separators.
///
/// Pure and infallible; failures belong to the underlying read call.
pub fn frame_lines(raw: &str) -> String {
    raw.split('\n')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
