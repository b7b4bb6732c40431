//! Import injector: ensures the two fixed imports barrier calls need are
//! present in a file, without disturbing any import already there.
//!
//! Detection is regex-based over the raw source text rather than tree-based:
//! cheap, independent of the parse tree, and sufficient because the only
//! question asked is "does an import of this exact path already exist, and
//! if so under what local name". Insertion position (when no import is
//! already present) is the line starting with `package `.

use once_cell::sync::Lazy;
use regex::Regex;

/// Import path of the race-detection runtime package. The runtime itself is
/// an external collaborator; this crate only fixes its import surface
/// (`Init`, `Fini`, `RaceRead(uintptr)`, `RaceWrite(uintptr)`).
pub const BARRIER_RUNTIME_PATH: &str = "racebarrier";

/// Canonical default local alias for the barrier-runtime package when no
/// import of it exists yet.
pub const DEFAULT_BARRIER_ALIAS: &str = "r";

/// The raw-pointer helper package: the standard library's own `unsafe`,
/// imported under its canonical name.
pub const POINTER_HELPER_PATH: &str = "unsafe";

/// What ends up bound to each fixed import after injection: either the
/// alias the injector added, or whatever alias/name an already-present
/// import used (an existing import with a different alias is honored
/// as-is).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedImports {
    pub barrier_alias: String,
    pub text_to_prepend: Option<String>,
    pub insert_after_line: Option<usize>,
}

fn import_re(prefix: &str, name: &str, path: &str, suffix: &str) -> String {
    format!(r#"\bimport {prefix}{name}"{path}"{suffix}"#)
}

const PREFIX: &str = r"\([^)]*";
const NAME: &str = r"(\.|[A-Za-z_][0-9A-Za-z_]*)( )?";
const SUFFIX: &str = r"[^)]*\)";

struct PathRes {
    named: Regex,
    unnamed: Regex,
    parenthesized_named: Regex,
    parenthesized_unnamed: Regex,
}

impl PathRes {
    fn for_path(path: &str) -> Self {
        Self {
            named: Regex::new(&import_re("", NAME, path, "")).unwrap(),
            unnamed: Regex::new(&import_re("", "", path, "")).unwrap(),
            parenthesized_named: Regex::new(&import_re(PREFIX, NAME, path, SUFFIX)).unwrap(),
            parenthesized_unnamed: Regex::new(&import_re(PREFIX, "", path, SUFFIX)).unwrap(),
        }
    }

    fn find<'a>(&self, contents: &'a str, default_name: &'a str) -> Option<&'a str> {
        if let Some(captures) = self.named.captures(contents) {
            Some(captures.get(1).unwrap().as_str())
        } else if self.unnamed.is_match(contents) {
            Some(default_name)
        } else if let Some(captures) = self.parenthesized_named.captures(contents) {
            Some(captures.get(1).unwrap().as_str())
        } else if self.parenthesized_unnamed.is_match(contents) {
            Some(default_name)
        } else {
            None
        }
    }
}

static BARRIER_RUNTIME_RE: Lazy<PathRes> = Lazy::new(|| PathRes::for_path(BARRIER_RUNTIME_PATH));
static POINTER_HELPER_RE: Lazy<PathRes> = Lazy::new(|| PathRes::for_path(POINTER_HELPER_PATH));

fn package_line(contents: &str) -> Option<usize> {
    contents.lines().position(|line| line.starts_with("package "))
}

/// Decides what, if anything, must be prepended to make both fixed imports
/// present, and under what local name the barrier-runtime package ends up
/// bound (needed by [`crate::instrument`] to know what to qualify
/// `RaceRead`/`RaceWrite`/`Init` calls with).
pub fn resolve(contents: &str) -> Option<ResolvedImports> {
    let barrier_alias = BARRIER_RUNTIME_RE.find(contents, DEFAULT_BARRIER_ALIAS);
    let pointer_helper = POINTER_HELPER_RE.find(contents, "unsafe");

    match (barrier_alias, pointer_helper) {
        (Some(alias), Some(_)) => Some(ResolvedImports {
            barrier_alias: alias.to_owned(),
            text_to_prepend: None,
            insert_after_line: None,
        }),
        (barrier_alias, pointer_helper) => {
            let package_line = package_line(contents)?;
            let mut lines = Vec::new();
            lines.push("import (".to_owned());
            if barrier_alias.is_none() {
                lines.push(format!("\t{DEFAULT_BARRIER_ALIAS} \"{BARRIER_RUNTIME_PATH}\""));
            }
            if pointer_helper.is_none() {
                lines.push(format!("\t\"{POINTER_HELPER_PATH}\""));
            }
            lines.push(")".to_owned());
            Some(ResolvedImports {
                barrier_alias: barrier_alias.unwrap_or(DEFAULT_BARRIER_ALIAS).to_owned(),
                text_to_prepend: Some(lines.join("\n") + "\n"),
                insert_after_line: Some(package_line),
            })
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn no_imports_yields_full_grouped_block() {
        let src = "package main\n\nfunc main() {}\n";
        let resolved = resolve(src).unwrap();
        assert_eq!(resolved.barrier_alias, "r");
        let text = resolved.text_to_prepend.unwrap();
        assert!(text.contains("racebarrier"));
        assert!(text.contains("unsafe"));
    }

    #[test]
    fn existing_differently_aliased_import_is_honored() {
        let src = "package main\n\nimport rt \"racebarrier\"\nimport \"unsafe\"\n\nfunc main() {}\n";
        let resolved = resolve(src).unwrap();
        assert_eq!(resolved.barrier_alias, "rt");
        assert!(resolved.text_to_prepend.is_none());
    }

    #[test]
    fn partial_presence_adds_only_the_missing_one() {
        let src = "package main\n\nimport \"unsafe\"\n\nfunc main() {}\n";
        let resolved = resolve(src).unwrap();
        let text = resolved.text_to_prepend.unwrap();
        assert!(text.contains("racebarrier"));
        assert!(!text.contains("\"unsafe\""));
    }
}
