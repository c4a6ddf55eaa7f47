// Platform profiles: per-source header tokens, aliases, and vocabularies

pub mod base;
pub mod registry;

pub mod alipay;
pub mod jingdong;
pub mod wechat;

pub use alipay::AlipayProfile;
pub use base::PlatformProfile;
pub use jingdong::JingdongProfile;
pub use registry::PlatformRegistry;
pub use wechat::WechatProfile;
