use super::base::PlatformProfile;
use crate::domain::{CanonicalField, Platform};
use crate::pipeline::processing::normalize::DirectionVocabulary;
use crate::pipeline::processing::reconcile::AliasTable;

const ALIASES: &AliasTable = &[
    (CanonicalField::TransactionTime, &["交易时间"]),
    (CanonicalField::Counterparty, &["交易对方"]),
    (CanonicalField::Amount, &["金额(元)", "金额（元）", "金额"]),
    (CanonicalField::Direction, &["收/支"]),
    (CanonicalField::ProductName, &["商品", "商品名称"]),
];

/// WeChat Pay exports: UTF-8 CSV with a preamble of roughly 16 lines
pub struct WechatProfile;

impl WechatProfile {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WechatProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformProfile for WechatProfile {
    fn platform(&self) -> Platform {
        Platform::Wechat
    }

    fn file_prefixes(&self) -> &'static [&'static str] {
        &["微信支付账单"]
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["csv"]
    }

    fn header_tokens(&self) -> &'static [&'static str] {
        &["交易时间", "交易类型"]
    }

    fn aliases(&self) -> &'static AliasTable {
        ALIASES
    }

    fn direction_vocabulary(&self) -> DirectionVocabulary {
        DirectionVocabulary {
            income: &["收入"],
            expense: &["支出"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wechat_only_takes_csv() {
        let profile = WechatProfile::new();
        assert!(profile.supports_extension("csv"));
        assert!(!profile.supports_extension("xlsx"));
        assert!(profile.matches_file_name("微信支付账单(20240101-20240331).csv"));
    }
}
