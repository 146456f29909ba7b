use serde::de::DeserializeOwned;

/// Parse a snake_case enum value using serde-deserialization.
pub fn parse_enum<T>(raw: &str, field: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let normalized = raw.trim().to_ascii_lowercase().replace('-', "_");
    let json = format!("\"{normalized}\"");
    serde_json::from_str(&json).map_err(|error| anyhow::anyhow!("invalid {field} '{raw}': {error}"))
}

/// Parse every value of a repeatable flag; an empty list means `all`.
pub fn parse_enum_list<T>(raw: &[String], field: &str, all: &[T]) -> anyhow::Result<Vec<T>>
where
    T: DeserializeOwned + Clone + PartialEq,
{
    if raw.is_empty() {
        return Ok(all.to_vec());
    }
    let mut parsed = Vec::with_capacity(raw.len());
    for value in raw {
        let value = parse_enum::<T>(value, field)?;
        if !parsed.contains(&value) {
            parsed.push(value);
        }
    }
    Ok(parsed)
}
