use regex::Regex;

/// Make a pattern match whole strings only: prepend `^` and append `$`
/// where missing.
pub fn anchor(pattern: &str) -> String {
    let pattern = pattern.trim();
    let mut anchored = String::with_capacity(pattern.len() + 2);
    if !pattern.starts_with('^') {
        anchored.push('^');
    }
    anchored.push_str(pattern);
    if !pattern.ends_with('$') {
        anchored.push('$');
    }
    anchored
}

/// Compile a pattern as a full-string match.
pub fn compile_anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&anchor(pattern))
}

/// The pattern as the author wrote it, without the anchors.
pub fn display_pattern(regex: &Regex) -> &str {
    let p = regex.as_str();
    let p = p.strip_prefix('^').unwrap_or(p);
    p.strip_suffix('$').unwrap_or(p)
}

/// Every group of a full match, the whole match first. Groups that did not
/// participate are empty strings.
pub fn capture_groups<'t>(regex: &Regex, text: &'t str) -> Option<Vec<&'t str>> {
    let caps = regex.captures(text)?;
    Some(
        caps.iter()
            .map(|m| m.map_or("", |m| m.as_str()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchors_are_added_once() {
        assert_eq!(anchor("a+"), "^a+$");
        assert_eq!(anchor("^a+$"), "^a+$");
        assert_eq!(anchor("  ^a+ "), "^a+$");
    }

    #[test]
    fn anchored_patterns_need_a_full_match() {
        let re = compile_anchored(r"I have (\d+) apples").unwrap();
        assert!(re.is_match("I have 3 apples"));
        assert!(!re.is_match("Now I have 3 apples"));
        assert_eq!(display_pattern(&re), r"I have (\d+) apples");
    }

    #[test]
    fn groups_include_whole_match_and_blanks() {
        let re = compile_anchored(r"(a)?(b)").unwrap();
        assert_eq!(capture_groups(&re, "b"), Some(vec!["b", "", "b"]));
        assert_eq!(capture_groups(&re, "c"), None);
    }
}
