use crate::domain::Platform;
use crate::pipeline::processing::normalize::DirectionVocabulary;
use crate::pipeline::processing::reconcile::AliasTable;

/// Everything that differs between one platform's exports and another's.
/// The cleaning stages themselves are shared.
pub trait PlatformProfile: Send + Sync {
    fn platform(&self) -> Platform;

    /// Display name used in reports
    fn name(&self) -> &'static str {
        self.platform().display_name()
    }

    /// File name prefixes identifying this platform's exports
    fn file_prefixes(&self) -> &'static [&'static str];

    /// Lowercase extensions without the dot
    fn supported_extensions(&self) -> &'static [&'static str];

    /// Tokens that must all appear on the header line
    fn header_tokens(&self) -> &'static [&'static str];

    fn aliases(&self) -> &'static AliasTable;

    fn direction_vocabulary(&self) -> DirectionVocabulary;

    fn matches_file_name(&self, file_name: &str) -> bool {
        self.file_prefixes()
            .iter()
            .any(|prefix| file_name.starts_with(prefix))
    }

    fn supports_extension(&self, extension: &str) -> bool {
        let extension = extension.trim_start_matches('.').to_lowercase();
        self.supported_extensions()
            .iter()
            .any(|supported| *supported == extension)
    }
}
