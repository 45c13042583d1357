use std::sync::LazyLock;

use regex::Regex;

const MAX_NAME_LEN: usize = 100;

static RESERVED_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1F\x7F]"#).expect("valid regex"));

static RELATIVE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.+$").expect("valid regex"));

static WINDOWS_RESERVED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(con|prn|aux|nul|com[0-9]|lpt[0-9])$").expect("valid regex")
});

/// Turn arbitrary text (a lane title, a mode name) into a single safe file name
/// component. Unsafe characters become `replacement`, runs of it collapse, and
/// the result is capped at 100 characters.
pub fn sanitize_file_name(name: &str, replacement: &str) -> String {
    let mut out = RESERVED_CHARS.replace_all(name, replacement).into_owned();
    out = RELATIVE_PATH.replace(&out, replacement).into_owned();

    if !replacement.is_empty() {
        let doubled = replacement.repeat(2);
        while out.contains(&doubled) {
            out = out.replace(&doubled, replacement);
        }
        if out.chars().count() > 1 {
            out = out
                .trim_start_matches(replacement)
                .trim_end_matches(replacement)
                .to_string();
        }
    }

    if WINDOWS_RESERVED.is_match(&out) {
        out.push_str(replacement);
    }

    out.chars().take(MAX_NAME_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_path_separators() {
        assert_eq!(sanitize_file_name("To Do/Later", "_"), "To Do_Later");
        assert_eq!(sanitize_file_name("a<b>c:d", "_"), "a_b_c_d");
    }

    #[test]
    fn collapses_and_trims_replacement() {
        assert_eq!(sanitize_file_name("//x??", "_"), "x");
        assert_eq!(sanitize_file_name("a///b", "_"), "a_b");
    }

    #[test]
    fn relative_and_reserved_names() {
        assert_eq!(sanitize_file_name("..", "_"), "_");
        assert_eq!(sanitize_file_name("con", "_"), "con_");
        assert_eq!(sanitize_file_name("Done", "_"), "Done");
    }

    #[test]
    fn caps_length() {
        let long = "x".repeat(300);
        assert_eq!(sanitize_file_name(&long, "_").len(), 100);
    }
}
