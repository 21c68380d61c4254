use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::ids::{CategoryId, ProductId, StoreId};

/// The purchasable context being priced. Owned by the caller; the evaluator
/// only reads it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationTarget {
    pub product_id: ProductId,
    pub category_id: CategoryId,
    pub store_id: StoreId,
    pub price: Decimal,
}
