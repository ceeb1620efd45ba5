use serde::{Deserialize, Deserializer};
use std::io::Read;

#[derive(Debug, Deserialize)]
pub(crate) struct CityRow {
    pub(crate) name: String,
    pub(crate) station_name: String,
    pub(crate) wmo_code: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BaseFeeRow {
    pub(crate) city: String,
    pub(crate) vehicle_type: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) fee: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConditionRuleRow {
    pub(crate) vehicle_type: String,
    pub(crate) category: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) phenomenon: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) min: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) max: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) fee: Option<String>,
    #[serde(default)]
    pub(crate) usage_forbidden: bool,
}

pub(crate) fn parse_rows<R, T>(reader: R) -> Result<Vec<T>, csv::Error>
where
    R: Read,
    T: for<'de> Deserialize<'de>,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader.deserialize::<T>().collect()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
