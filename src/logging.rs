use tracing_subscriber::{fmt, EnvFilter};

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// Bound a raw protocol line for debug logging, cutting on a char boundary.
pub fn truncate_for_log(line: &str, max_bytes: usize) -> String {
    if line.len() <= max_bytes {
        return line.to_string();
    }

    let mut end = max_bytes;
    while end > 0 && !line.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated]", &line[..end])
}

#[cfg(test)]
mod tests {
    use super::truncate_for_log;

    #[test]
    fn short_lines_pass_through() {
        assert_eq!(truncate_for_log("hello", 500), "hello");
    }

    #[test]
    fn long_lines_are_marked_truncated() {
        let line = "x".repeat(600);
        let truncated = truncate_for_log(&line, 500);
        assert!(truncated.ends_with("...[truncated]"));
        assert!(truncated.len() < line.len());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let line = "é".repeat(300);
        let truncated = truncate_for_log(&line, 501);
        assert!(truncated.ends_with("...[truncated]"));
        assert!(truncated.starts_with('é'));
    }
}
