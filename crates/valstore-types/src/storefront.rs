//! Typed projection of the upstream storefront payload
//!
//! Only the fields consumers read are modelled. Every field defaults, so a
//! payload with missing sections still decodes; callers that need the exact
//! upstream document use the raw pass-through instead.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Currency id -> amount
pub type Cost = HashMap<String, i64>;

/// Player storefront
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Storefront {
    pub featured_bundle: FeaturedBundle,
    pub skins_panel_layout: SkinsPanelLayout,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus_store: Option<BonusStore>,
    pub accessory_store: AccessoryStore,
    pub upgrade_currency_store: UpgradeCurrencyStore,
}

impl Storefront {
    /// Item ids of today's single-item offers
    pub fn daily_offer_ids(&self) -> &[String] {
        &self.skins_panel_layout.single_item_offers
    }

    /// Whether the bonus ("night market") store is open
    pub fn has_bonus_store(&self) -> bool {
        self.bonus_store
            .as_ref()
            .is_some_and(|b| !b.bonus_store_offers.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FeaturedBundle {
    pub bundle: Bundle,
    pub bundles: Vec<Bundle>,
    pub bundle_remaining_duration_in_seconds: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Bundle {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "DataAssetID")]
    pub data_asset_id: String,
    #[serde(rename = "CurrencyID")]
    pub currency_id: String,
    pub items: Vec<BundleItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub item_offers: Vec<BundleItemOffer>,
    pub total_base_cost: Cost,
    pub total_discounted_cost: Cost,
    pub total_discount_percent: f64,
    pub duration_remaining_in_seconds: i64,
    pub wholesale_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BundleItem {
    pub item: ItemInfo,
    pub base_price: i64,
    pub discount_percent: f64,
    pub discounted_price: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BundleItemOffer {
    #[serde(rename = "BundleItemOfferID")]
    pub bundle_item_offer_id: String,
    pub offer: Offer,
    pub discount_percent: f64,
    pub discounted_cost: Cost,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemInfo {
    #[serde(rename = "ItemTypeID")]
    pub item_type_id: String,
    #[serde(rename = "ItemID")]
    pub item_id: String,
    #[serde(rename = "Amount")]
    pub amount: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Offer {
    #[serde(rename = "OfferID")]
    pub offer_id: String,
    pub is_direct_purchase: bool,
    pub start_date: String,
    pub cost: Cost,
    pub rewards: Vec<ItemReward>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemReward {
    #[serde(rename = "ItemTypeID")]
    pub item_type_id: String,
    #[serde(rename = "ItemID")]
    pub item_id: String,
    #[serde(rename = "Quantity")]
    pub quantity: i64,
}

/// Daily rotating single-item offers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SkinsPanelLayout {
    pub single_item_offers: Vec<String>,
    pub single_item_store_offers: Vec<Offer>,
    pub single_item_offers_remaining_duration_in_seconds: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BonusStore {
    pub bonus_store_offers: Vec<BonusStoreOffer>,
    pub bonus_store_remaining_duration_in_seconds: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BonusStoreOffer {
    #[serde(rename = "BonusOfferID")]
    pub bonus_offer_id: String,
    pub offer: Offer,
    pub discount_percent: f64,
    pub discount_costs: Cost,
    pub is_seen: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AccessoryStore {
    pub accessory_store_offers: Vec<AccessoryStoreOffer>,
    pub accessory_store_remaining_duration_in_seconds: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AccessoryStoreOffer {
    pub offer: Offer,
    #[serde(rename = "ContractID")]
    pub contract_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UpgradeCurrencyStore {
    pub upgrade_currency_offers: Vec<UpgradeCurrencyOffer>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UpgradeCurrencyOffer {
    #[serde(rename = "OfferID")]
    pub offer_id: String,
    #[serde(rename = "StorefrontItemID")]
    pub storefront_item_id: String,
    pub offer: Offer,
}
