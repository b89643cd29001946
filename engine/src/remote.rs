//! Wire types shared by the remote cart service and its clients.

use crate::{ProductId, Quantity, RemoteCartLine, VariantId};
use serde::{Deserialize, Serialize};

/// Body of `POST /cart/lines`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLineRequest {
    pub product_id: ProductId,
    pub quantity: Quantity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_id: Option<VariantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_id: Option<VariantId>,
}

/// Body of `PATCH /cart/lines/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityRequest {
    pub quantity: Quantity,
}

/// Response of `GET /cart/lines`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinesResponse {
    pub lines: Vec<RemoteCartLine>,
}

/// Error body returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
