use super::base::PlatformProfile;
use crate::domain::{CanonicalField, Platform};
use crate::pipeline::processing::normalize::DirectionVocabulary;
use crate::pipeline::processing::reconcile::AliasTable;

const ALIASES: &AliasTable = &[
    (CanonicalField::TransactionTime, &["交易时间"]),
    (CanonicalField::Counterparty, &["商户名称", "交易对方"]),
    (CanonicalField::Amount, &["金额", "金额(元)"]),
    (CanonicalField::Direction, &["收/支"]),
    (CanonicalField::ProductName, &["交易说明", "商品名称"]),
];

pub struct JingdongProfile;

impl JingdongProfile {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JingdongProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformProfile for JingdongProfile {
    fn platform(&self) -> Platform {
        Platform::Jingdong
    }

    // "京东" also covers "京东商城" exports
    fn file_prefixes(&self) -> &'static [&'static str] {
        &["京东"]
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["csv", "xls", "xlsx"]
    }

    fn header_tokens(&self) -> &'static [&'static str] {
        &["交易时间", "商户名称"]
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
