use super::base::PlatformProfile;
use crate::domain::{CanonicalField, Platform};
use crate::pipeline::processing::normalize::DirectionVocabulary;
use crate::pipeline::processing::reconcile::AliasTable;

const ALIASES: &AliasTable = &[
    (CanonicalField::TransactionTime, &["交易时间", "交易创建时间"]),
    (CanonicalField::Counterparty, &["交易对方"]),
    (CanonicalField::Amount, &["金额", "金额（元）"]),
    (CanonicalField::Direction, &["收/支", "收支类型", "类型"]),
    (CanonicalField::ProductName, &["商品名称", "商品说明"]),
];

/// Alipay exports: CSV (usually GBK with a long preamble) or spreadsheets
pub struct AlipayProfile;

impl AlipayProfile {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AlipayProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformProfile for AlipayProfile {
    fn platform(&self) -> Platform {
        Platform::Alipay
    }

    fn file_prefixes(&self) -> &'static [&'static str] {
        &["alipay"]
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["csv", "xls", "xlsx"]
    }

    fn header_tokens(&self) -> &'static [&'static str] {
        &["交易时间", "交易类型", "交易对方"]
    }

    fn aliases(&self) -> &'static AliasTable {
        ALIASES
    }

    fn direction_vocabulary(&self) -> DirectionVocabulary {
        DirectionVocabulary {
            income: &["收入", "转入", "收款"],
            expense: &["支出", "转出", "付款"],
        }
    }
}
