use diesel::deserialize::{FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::serialize;
use diesel::serialize::{Output, ToSql, IsNull};
use diesel::sql_types::Text;
use diesel::sqlite::{Sqlite, SqliteValue};
use serde::{Deserialize, Serialize};

/// A JSON document stored in a text column
///
/// Serializes transparently, so a `JsonValue` holding `["a", "b"]` appears in
/// API responses as the array itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(transparent)]
pub struct JsonValue(pub serde_json::Value);

impl JsonValue {
    /// An empty JSON array
    pub fn empty_list() -> Self {
        JsonValue(serde_json::Value::Array(Vec::new()))
    }

    /// Builds a JSON array of strings
    pub fn string_list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        JsonValue(serde_json::Value::Array(
            values.into_iter().map(|v| serde_json::Value::String(v.into())).collect(),
        ))
    }

    /// Returns the contents as strings if this is an array made only of strings
    pub fn as_string_list(&self) -> Option<Vec<&str>> {
        self.0
            .as_array()?
            .iter()
            .map(|v| v.as_str())
            .collect()
    }
}

impl FromSql<Text, Sqlite> for JsonValue {
    fn from_sql(value: SqliteValue<'_, '_, '_>) -> diesel::deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
        let value = serde_json::from_str(&text)?;
        Ok(JsonValue(value))
    }
}

impl ToSql<Text, Sqlite> for JsonValue {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(serde_json::to_string(&self.0)?);
        Ok(IsNull::No)
    }
}
