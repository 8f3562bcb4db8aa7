use serde::{de::Error, Deserialize, Deserializer};

/// Store records carry numbers either as JSON numbers or as numeric strings
/// (form inputs are saved verbatim), so both shapes are accepted.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl NumberOrText {
    fn into_i64<E: Error>(self) -> Result<Option<i64>, E> {
        match self {
            NumberOrText::Integer(n) => Ok(Some(n)),
            NumberOrText::Float(f) if f.fract() == 0.0 && f.is_finite() => Ok(Some(f as i64)),
            NumberOrText::Float(f) => Err(E::custom(format!("expected an integer, got {}", f))),
            NumberOrText::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                trimmed
                    .parse::<i64>()
                    .map(Some)
                    .map_err(|_| E::custom(format!("expected a number, got {:?}", text)))
            }
        }
    }
}

fn narrow<T, E>(raw: i64) -> Result<T, E>
where
    T: TryFrom<i64>,
    E: Error,
{
    T::try_from(raw).map_err(|_| E::custom(format!("number {} is out of range", raw)))
}

/// Deserialize a required integer from a number or numeric string
pub fn deserialize_integer<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    match NumberOrText::deserialize(deserializer)?.into_i64::<D::Error>()? {
        Some(raw) => narrow(raw),
        None => Err(D::Error::custom("expected a number, got an empty string")),
    }
}

/// Deserialize an optional integer; `null` and `""` both mean absent
pub fn deserialize_optional_integer<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        Some(value) => match value.into_i64::<D::Error>()? {
            Some(raw) => narrow(raw).map(Some),
            None => Ok(None),
        },
        None => Ok(None),
    }
}
