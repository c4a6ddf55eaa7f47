use super::{AlipayProfile, JingdongProfile, PlatformProfile, WechatProfile};
use crate::domain::Platform;

/// Registry of platform profiles, kept in processing order
pub struct PlatformRegistry {
    profiles: Vec<Box<dyn PlatformProfile>>,
}

impl PlatformRegistry {
    /// Create a registry with the built-in profiles
    pub fn new() -> Self {
        Self {
            profiles: vec![
                Box::new(AlipayProfile::new()),
                Box::new(WechatProfile::new()),
                Box::new(JingdongProfile::new()),
            ],
        }
    }

    /// Register a profile, replacing any existing one for the same platform
    pub fn register(&mut self, profile: Box<dyn PlatformProfile>) {
        match self
            .profiles
            .iter()
            .position(|p| p.platform() == profile.platform())
        {
            Some(idx) => self.profiles[idx] = profile,
            None => self.profiles.push(profile),
        }
    }

    pub fn get(&self, platform: Platform) -> Option<&dyn PlatformProfile> {
        self.profiles
            .iter()
            .find(|p| p.platform() == platform)
            .map(|p| p.as_ref())
    }

    pub fn profiles(&self) -> impl Iterator<Item = &dyn PlatformProfile> {
        self.profiles.iter().map(|p| p.as_ref())
    }

    pub fn list_platforms(&self) -> Vec<Platform> {
        self.profiles.iter().map(|p| p.platform()).collect()
    }

    /// Profile whose prefix and extension both match `file_name`
    pub fn detect_for_file(&self, file_name: &str) -> Option<&dyn PlatformProfile> {
        let extension = file_name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
        self.profiles()
            .find(|p| p.matches_file_name(file_name) && p.supports_extension(extension))
    }
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_built_in_profiles_in_order() {
        let registry = PlatformRegistry::new();
        assert_eq!(registry.list_platforms(), Platform::ALL.to_vec());
    }

    #[test]
    fn test_detect_for_file() {
        let registry = PlatformRegistry::new();
        assert_eq!(
            registry.detect_for_file("微信支付账单(2024).csv").map(|p| p.platform()),
            Some(Platform::Wechat)
        );
        assert!(registry.detect_for_file("微信支付账单(2024).xlsx").is_none());
        assert!(registry.detect_for_file("notes.txt").is_none());
    }
}
