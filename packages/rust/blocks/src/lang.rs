//! Code-block language whitelist.
//!
//! Notion's code blocks only accept a fixed set of language identifiers.
//! Anything else (including an empty hint) is normalized to the
//! `"plain text"` fallback so a compiled block never carries a language the
//! downstream API would reject.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Fallback identifier for unrecognized or missing language hints.
pub const PLAIN_TEXT: &str = "plain text";

/// Language identifiers accepted by the Notion code block API.
static LANGUAGES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "abap",
        "agda",
        "arduino",
        "ascii art",
        "assembly",
        "bash",
        "basic",
        "bnf",
        "c",
        "c#",
        "c++",
        "clojure",
        "coffeescript",
        "coq",
        "css",
        "dart",
        "dhall",
        "diff",
        "docker",
        "ebnf",
        "elixir",
        "elm",
        "erlang",
        "f#",
        "flow",
        "fortran",
        "gherkin",
        "glsl",
        "go",
        "graphql",
        "groovy",
        "haskell",
        "hcl",
        "html",
        "idris",
        "java",
        "java/c/c++/c#",
        "javascript",
        "json",
        "julia",
        "kotlin",
        "latex",
        "less",
        "lisp",
        "livescript",
        "llvm ir",
        "lua",
        "makefile",
        "markdown",
        "markup",
        "mathematica",
        "matlab",
        "mermaid",
        "nix",
        "notion formula",
        "objective-c",
        "ocaml",
        "pascal",
        "perl",
        "php",
        "plain text",
        "powershell",
        "prolog",
        "protobuf",
        "purescript",
        "python",
        "r",
        "racket",
        "reason",
        "ruby",
        "rust",
        "sass",
        "scala",
        "scheme",
        "scss",
        "shell",
        "smalltalk",
        "solidity",
        "sql",
        "swift",
        "toml",
        "typescript",
        "vb.net",
        "verilog",
        "vhdl",
        "visual basic",
        "webassembly",
        "xml",
        "yaml",
    ])
});

/// Normalize a fence info string to a whitelisted language identifier.
///
/// The hint is trimmed and lower-cased; unknown hints become
/// [`PLAIN_TEXT`].
pub fn normalize_language(hint: &str) -> String {
    let normalized = hint.trim().to_lowercase();
    if LANGUAGES.contains(normalized.as_str()) {
        normalized
    } else {
        PLAIN_TEXT.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_languages_pass_through() {
        assert_eq!(normalize_language("python"), "python");
        assert_eq!(normalize_language("rust"), "rust");
        assert_eq!(normalize_language("plain text"), "plain text");
    }

    #[test]
    fn hint_is_trimmed_and_lowercased() {
        assert_eq!(normalize_language("  Python  "), "python");
        assert_eq!(normalize_language("TypeScript"), "typescript");
    }

    #[test]
    fn unknown_hint_falls_back() {
        assert_eq!(normalize_language("klingon"), PLAIN_TEXT);
        assert_eq!(normalize_language("py3"), PLAIN_TEXT);
    }

    #[test]
    fn empty_hint_falls_back() {
        assert_eq!(normalize_language(""), PLAIN_TEXT);
        assert_eq!(normalize_language("   "), PLAIN_TEXT);
    }

    #[test]
    fn whitelist_is_reasonably_sized() {
        // Guard against accidental truncation when editing the set.
        assert!(LANGUAGES.len() >= 85);
    }
}
