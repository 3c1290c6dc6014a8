//! Model providers: JSON declaration files and Java source trees.
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use super::{java, Declaration, DeclarationModel};
use crate::error::GenError;
use crate::path_de;

/// File extension of scanned sources.
pub const JAVA_EXTENSION: &str = "java";

/// Build the model: Java sources first (in discovery order), then JSON models.
pub fn build_model(
    source_patterns: &[String],
    model_files: &[PathBuf],
    ndjson: bool,
) -> Result<DeclarationModel, GenError> {
    let sources = discover_sources(source_patterns)?;
    tracing::debug!(files = sources.len(), "scanning java sources");
    let mut decls = scan_sources(&sources)?;
    for path in model_files {
        decls.extend(load_json_model(path, ndjson)?);
    }
    let model = DeclarationModel::from_declarations(decls);
    tracing::info!(declarations = model.len(), "declaration model built");
    Ok(model)
}

/// Parse every file, in parallel, keeping input order.
pub fn scan_sources(paths: &[PathBuf]) -> Result<Vec<Declaration>, GenError> {
    let per_file = paths
        .par_iter()
        .map(|path| {
            let src = std::fs::read_to_string(path).map_err(|source| GenError::Read {
                path: path.clone(),
                source,
            })?;
            Ok(java::parse_compilation_unit(&src, Some(path)))
        })
        .collect::<Result<Vec<_>, GenError>>()?;
    Ok(per_file.into_iter().flatten().collect())
}

/// A JSON array of declarations, or one declaration per line with `ndjson`.
pub fn load_json_model(path: &Path, ndjson: bool) -> Result<Vec<Declaration>, GenError> {
    let src = std::fs::read_to_string(path).map_err(|source| GenError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let model_err = |message: String| GenError::Model { path: path.to_path_buf(), message };

    let mut decls: Vec<Declaration> = if ndjson {
        let mut out = Vec::new();
        for (ix, line) in src.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            out.push(path_de::from_line_with_path(line, ix + 1).map_err(model_err)?);
        }
        out
    } else {
        path_de::from_str_with_path(&src).map_err(model_err)?
    };

    for decl in &mut decls {
        if decl.source.is_none() {
            decl.source = Some(path.to_path_buf());
        }
    }
    Ok(decls)
}

/// Expand `--source` inputs to a sorted, de-duplicated list of source files.
///
/// Each input is a directory (walked for `*.java`), a quoted glob pattern, or
/// a literal file path.
pub fn discover_sources<I>(patterns: I) -> Result<Vec<PathBuf>, GenError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    fn expand(pattern: &str, out: &mut Vec<PathBuf>) -> Result<usize, GenError> {
        let input_err = |message: String| GenError::Input {
            pattern: pattern.to_string(),
            message,
        };
        let mut matched = 0;
        for entry in glob::glob(pattern).map_err(|e| input_err(e.to_string()))? {
            let path = entry.map_err(|e| input_err(e.to_string()))?;
            if path.is_file() {
                matched += 1;
                out.push(path);
            }
        }
        Ok(matched)
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();
        let path = Path::new(pattern);

        if path.is_dir() {
            let walk = format!(
                "{}/**/*.{JAVA_EXTENSION}",
                glob::Pattern::escape(&path.to_string_lossy())
            );
            expand(&walk, &mut out)?;
        } else if has_glob_chars(pattern) {
            if expand(pattern, &mut out)? == 0 {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                return Err(GenError::Input {
                    pattern: pattern.to_string(),
                    message: "glob pattern matched no files".to_string(),
                });
            }
        } else if path.is_file() {
            out.push(path.to_path_buf());
        } else {
            return Err(GenError::Input {
                pattern: pattern.to_string(),
                message: "no such file or directory".to_string(),
            });
        }
    }

    out.sort();
    out.dedup();
    Ok(out)
}
