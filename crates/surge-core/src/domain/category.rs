use serde::{Deserialize, Serialize};
use std::fmt;

/// Remote-call category an operation is bound to.
///
/// Each category has its own caller (a distinct remote endpoint). The serialized
/// names double as the prefix of generated operation keys (`catalogueApi-1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApiCategory {
    CatalogueApi,
    DiscoveryApi,
    SearchApi,
    OrderApi,
    SubscriptionApi,
    PimApi,
    NextPimApi,
}

impl ApiCategory {
    pub const ALL: [ApiCategory; 7] = [
        ApiCategory::CatalogueApi,
        ApiCategory::DiscoveryApi,
        ApiCategory::SearchApi,
        ApiCategory::OrderApi,
        ApiCategory::SubscriptionApi,
        ApiCategory::PimApi,
        ApiCategory::NextPimApi,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ApiCategory::CatalogueApi => "catalogueApi",
            ApiCategory::DiscoveryApi => "discoveryApi",
            ApiCategory::SearchApi => "searchApi",
            ApiCategory::OrderApi => "orderApi",
            ApiCategory::SubscriptionApi => "subscriptionApi",
            ApiCategory::PimApi => "pimApi",
            ApiCategory::NextPimApi => "nextPimApi",
        }
    }
}

impl fmt::Display for ApiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
