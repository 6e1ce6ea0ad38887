//! Label content

use serde::{Deserialize, Serialize};

use crate::error::{LabelError, LabelResult};

/// Content of one physical label
///
/// The barcode is always non-empty; construction through [`BarcodeLabel::new`]
/// or deserialization rejects an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "LabelFields")]
pub struct BarcodeLabel {
    barcode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sku: Option<String>,
}

impl BarcodeLabel {
    pub fn new(barcode: impl Into<String>) -> LabelResult<Self> {
        let barcode = barcode.into();
        if barcode.is_empty() {
            return Err(LabelError::EmptyBarcode);
        }
        Ok(Self {
            barcode,
            product_name: None,
            price: None,
            sku: None,
        })
    }

    /// Set the product name (empty strings are treated as absent)
    pub fn with_product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = non_empty(name.into());
        self
    }

    /// Set the price, printed verbatim after the currency prefix
    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = non_empty(price.into());
        self
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = non_empty(sku.into());
        self
    }

    pub fn barcode(&self) -> &str {
        &self.barcode
    }

    pub fn product_name(&self) -> Option<&str> {
        self.product_name.as_deref()
    }

    pub fn price(&self) -> Option<&str> {
        self.price.as_deref()
    }

    pub fn sku(&self) -> Option<&str> {
        self.sku.as_deref()
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LabelFields {
    barcode: String,
    product_name: Option<String>,
    price: Option<String>,
    sku: Option<String>,
}

impl TryFrom<LabelFields> for BarcodeLabel {
    type Error = LabelError;

    fn try_from(f: LabelFields) -> Result<Self, Self::Error> {
        let mut label = BarcodeLabel::new(f.barcode)?;
        label.product_name = f.product_name.and_then(non_empty);
        label.price = f.price.and_then(non_empty);
        label.sku = f.sku.and_then(non_empty);
        Ok(label)
    }
}
