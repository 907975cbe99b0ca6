//! Caller-chain capture for the `*_trace` producer entry points.

use backtrace::Backtrace;

/// Frames belonging to the logger itself or the capture machinery; skipped
/// before counting caller frames.
const INTERNAL_PREFIXES: &[&str] = &["backtrace::", "logspool::", "std::", "core::"];

/// Capture up to `depth` caller frames, rendered caller→callee and joined
/// with `" -> "`. Frames without a resolvable symbol render as `(unknown)`.
///
/// Returns `None` when `depth` is zero or nothing user-level could be
/// captured. Depth is capped at 10.
#[must_use]
pub fn capture(depth: u8) -> Option<String> {
    if depth == 0 {
        return None;
    }
    let depth = usize::from(depth.min(10));

    let bt = Backtrace::new();
    let mut frames: Vec<String> = Vec::with_capacity(depth);

    for frame in bt.frames() {
        if frames.len() == depth {
            break;
        }
        let name = frame
            .symbols()
            .first()
            .and_then(|sym| sym.name())
            .map(|n| n.to_string());

        match name {
            Some(name) => {
                if INTERNAL_PREFIXES.iter().any(|p| name.starts_with(p)) {
                    continue;
                }
                frames.push(trim_hash_suffix(&name).to_string());
            }
            None => frames.push("(unknown)".to_string()),
        }
    }

    if frames.is_empty() {
        return None;
    }
    // Captured callee-first; the rendered chain reads caller→callee.
    frames.reverse();
    Some(frames.join(" -> "))
}

/// Strip the trailing `::h0123abcd` disambiguation hash rustc appends.
fn trim_hash_suffix(name: &str) -> &str {
    match name.rfind("::h") {
        Some(idx) if name[idx + 3..].chars().all(|c| c.is_ascii_hexdigit()) => &name[..idx],
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_depth_captures_nothing() {
        assert!(capture(0).is_none());
    }

    #[test]
    fn capture_is_bounded() {
        if let Some(chain) = capture(3) {
            assert!(chain.split(" -> ").count() <= 3);
        }
    }

    #[test]
    fn depth_is_capped_at_ten() {
        if let Some(chain) = capture(200) {
            assert!(chain.split(" -> ").count() <= 10);
        }
    }

    #[test]
    fn hash_suffix_trimmed() {
        assert_eq!(trim_hash_suffix("app::main::h0123456789abcdef"), "app::main");
        assert_eq!(trim_hash_suffix("app::main"), "app::main");
        assert_eq!(trim_hash_suffix("weird::hxyz"), "weird::hxyz");
    }
}
