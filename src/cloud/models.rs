use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::common::{DecodeSnafu, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct License {
    #[serde(rename = "licenseId")]
    pub license_id: Option<String>,
    pub credit: Option<String>,
    #[serde(rename = "ratePlan")]
    pub rate_plan: Option<String>,
    pub expiration: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Machine {
    #[serde(rename = "_id")]
    pub machine_id: Option<String>,
    pub state: Option<String>,
    #[serde(rename = "DNSName")]
    pub dns_name: Option<String>,
    #[serde(rename = "createTime")]
    pub create_time: Option<String>,
    #[serde(rename = "machineType")]
    pub machine_type: Option<String>,
    pub region: Option<String>,
    #[serde(rename = "licenseType")]
    pub license_type: Option<String>,
    #[serde(rename = "licenseId")]
    pub license_id: Option<String>,
    #[serde(rename = "userPassword")]
    pub user_password: Option<String>,
    #[serde(rename = "idleShutdown")]
    pub idle_shutdown: Option<i64>,
}

/// Decodes a response body holding a JSON array of objects.
///
/// Missing fields are left as `None` and unknown fields are ignored, but the
/// payload must be an array and every element an object.
pub fn decode_records<T: DeserializeOwned>(body: &str) -> Result<Vec<T>> {
    let payload: Value = serde_json::from_str(body).map_err(|err| {
        DecodeSnafu {
            message: format!("response is not valid JSON: {err}"),
        }
        .build()
    })?;

    let items = match payload {
        Value::Array(items) => items,
        other => {
            return DecodeSnafu {
                message: format!("expected a JSON array, got {}", kind_of(&other)),
            }
            .fail()
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return DecodeSnafu {
                    message: format!("element {index} is {}, not an object", kind_of(&item)),
                }
                .fail();
            }
            serde_json::from_value(item).map_err(|err| {
                DecodeSnafu {
                    message: format!("element {index}: {err}"),
                }
                .build()
            })
        })
        .collect()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
