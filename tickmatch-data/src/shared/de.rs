// Deserialize a `String` into lowercase.
pub fn de_lowercase<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    let data: &str = serde::de::Deserialize::deserialize(deserializer)?;
    Ok(data.to_lowercase())
}
