use crate::{ApiResult, Failure};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// Failures are written as their message; reading one back yields a plain
// message failure.
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum SnapshotRef<'a, T> {
    Loading,
    Success { value: &'a T },
    Error { message: String },
}

#[derive(Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Snapshot<T> {
    Loading,
    Success { value: T },
    Error { message: String },
}

impl<T: Serialize> Serialize for ApiResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let snapshot = match self {
            ApiResult::Loading => SnapshotRef::Loading,
            ApiResult::Success { value } => SnapshotRef::Success { value },
            ApiResult::Error { error } => SnapshotRef::Error {
                message: error.to_string(),
            },
        };
        snapshot.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ApiResult<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Snapshot::deserialize(deserializer)? {
            Snapshot::Loading => ApiResult::Loading,
            Snapshot::Success { value } => ApiResult::Success { value },
            Snapshot::Error { message } => ApiResult::Error {
                error: Failure::msg(message),
            },
        })
    }
}
