use serde::de::DeserializeOwned;

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
        let path = err.path().to_string();
        format!("at JSON path {path} → {}", err.into_inner())
    })
}

/// Same as [`from_str_with_path`] for one NDJSON record; `line` is 1-based.
pub fn from_line_with_path<T: DeserializeOwned>(src: &str, line: usize) -> Result<T, String> {
    from_str_with_path(src).map_err(|msg| format!("line {line}: {msg}"))
}
