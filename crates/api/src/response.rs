//! Response envelope for read endpoints.

use serde::Serialize;

/// `{ "data": T }`.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
