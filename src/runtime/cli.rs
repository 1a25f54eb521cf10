//! Generated-binary argument grammar:
//! `key=value` pairs plus `-include <file>` for recursively loading
//! parameter files. This is deliberately hand-rolled rather than built on
//! `clap` (the compiler driver's own CLI, in [`crate::main`], does use
//! `clap`): `clap`'s flags are declared statically at compile time, but
//! here every key is a model variable name unknown until a model is
//! loaded, so the grammar has to be parsed by hand.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CliParseError {
    #[error("-include requires a file path argument")]
    MissingIncludePath,
    #[error("failed to read parameter file {0}: {1}")]
    IncludeReadFailed(String, String),
    #[error("argument {0:?} is neither key=value nor -include")]
    Malformed(String),
}

/// Parsed `key=value` overrides, later entries winning over earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamOverrides {
    pub values: BTreeMap<String, String>,
}

impl ParamOverrides {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Parse `argv` (excluding argv[0]) into [`ParamOverrides`], recursively
/// expanding `-include <file>` into the key=value lines the file
/// contains. A later assignment of the same key — whether from
/// a later argv entry or a later line in an included file — wins.
pub fn parse_args(argv: &[String]) -> Result<ParamOverrides, CliParseError> {
    let mut overrides = ParamOverrides::default();
    let mut i = 0;
    while i < argv.len() {
        let arg = &argv[i];
        if arg == "-include" {
            let path = argv.get(i + 1).ok_or(CliParseError::MissingIncludePath)?;
            apply_include(path, &mut overrides)?;
            i += 2;
        } else if let Some((key, value)) = arg.split_once('=') {
            overrides.values.insert(key.to_string(), value.to_string());
            i += 1;
        } else {
            return Err(CliParseError::Malformed(arg.clone()));
        }
    }
    Ok(overrides)
}

fn apply_include(path: &str, overrides: &mut ParamOverrides) -> Result<(), CliParseError> {
    let text = fs::read_to_string(Path::new(path))
        .map_err(|e| CliParseError::IncludeReadFailed(path.to_string(), e.to_string()))?;
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("-include ") {
            apply_include(rest.trim(), overrides)?;
        } else if let Some((key, value)) = line.split_once('=') {
            overrides.values.insert(key.to_string(), value.to_string());
        }
    }
    Ok(())
}

/// Exit code convention for the generated binary's `main`:
/// `0` on normal completion, `1` on a [`crate::error::RuntimeError`]
/// printed to stderr as `Exception: <message>`.
pub fn report_and_exit_code(result: Result<(), crate::error::RuntimeError>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Exception: {e}");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_key_value_pairs() {
        let argv = vec!["a=1".to_string(), "b=2".to_string()];
        let overrides = parse_args(&argv).unwrap();
        assert_eq!(overrides.get("a"), Some("1"));
        assert_eq!(overrides.get("b"), Some("2"));
    }

    #[test]
    fn later_assignment_of_the_same_key_wins() {
        let argv = vec!["a=1".to_string(), "a=2".to_string()];
        let overrides = parse_args(&argv).unwrap();
        assert_eq!(overrides.get("a"), Some("2"));
    }

    #[test]
    fn include_loads_key_value_lines_from_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.txt");
        std::fs::write(&path, "x=10\ny=20\n").unwrap();
        let argv = vec!["-include".to_string(), path.to_string_lossy().to_string(), "x=99".to_string()];
        let overrides = parse_args(&argv).unwrap();
        assert_eq!(overrides.get("x"), Some("99"));
        assert_eq!(overrides.get("y"), Some("20"));
    }

    #[test]
    fn missing_include_path_is_an_error() {
        let argv = vec!["-include".to_string()];
        assert!(matches!(parse_args(&argv), Err(CliParseError::MissingIncludePath)));
    }

    #[test]
    fn malformed_argument_is_rejected() {
        let argv = vec!["notkeyvalue".to_string()];
        assert!(matches!(parse_args(&argv), Err(CliParseError::Malformed(_))));
    }

    #[test]
    fn exit_code_reflects_runtime_error() {
        assert_eq!(report_and_exit_code(Ok(())), 0);
        assert_eq!(report_and_exit_code(Err(crate::error::RuntimeError::ArithmeticTrap)), 1);
    }
}
