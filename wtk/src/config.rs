//! Framebuffer and context configuration requested for every window.

/// The OpenGL version to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// The major version.
    pub major: u8,
    /// The minor version.
    pub minor: u8,
}

impl Version {
    /// Create a new version with the given `major` and `minor` values.
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

/// Describes the requested OpenGL context profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlProfile {
    /// Include all the immediate more functions and definitions.
    Compatibility,
    /// Include all the future-compatible functions and definitions.
    Core,
}

/// The template describing the framebuffer and the context of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigTemplate {
    /// The requested context version.
    pub(crate) version: Version,

    /// The requested context profile.
    pub(crate) profile: GlProfile,

    /// Number of bits per color component.
    pub(crate) color_size: u8,

    /// The size of the alpha.
    pub(crate) alpha_size: u8,

    /// The size of the depth buffer.
    pub(crate) depth_size: u8,

    /// The size of the stencil buffer.
    pub(crate) stencil_size: u8,

    /// Whether the surface is double buffered.
    pub(crate) double_buffer: bool,
}

impl ConfigTemplate {
    /// The requested context version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// The requested context profile.
    pub fn profile(&self) -> GlProfile {
        self.profile
    }

    /// Bits per color component.
    pub fn color_size(&self) -> u8 {
        self.color_size
    }

    /// Bits in the alpha channel.
    pub fn alpha_size(&self) -> u8 {
        self.alpha_size
    }

    /// Bits in the depth buffer.
    pub fn depth_size(&self) -> u8 {
        self.depth_size
    }

    /// Bits in the stencil buffer.
    pub fn stencil_size(&self) -> u8 {
        self.stencil_size
    }

    /// Whether double buffering is requested.
    pub fn double_buffer(&self) -> bool {
        self.double_buffer
    }

    /// Sum of all the color bits, the way pixel format descriptors count them.
    pub(crate) fn total_color_bits(&self) -> u8 {
        self.color_size.saturating_mul(3).saturating_add(self.alpha_size)
    }
}

impl Default for ConfigTemplate {
    fn default() -> Self {
        ConfigTemplate {
            version: Version::new(3, 3),
            profile: GlProfile::Core,
            color_size: 8,
            alpha_size: 8,
            depth_size: 24,
            stencil_size: 8,
            double_buffer: true,
        }
    }
}

/// Builder for the [`ConfigTemplate`].
#[derive(Debug, Default, Clone)]
pub struct ConfigTemplateBuilder {
    template: ConfigTemplate,
}

impl ConfigTemplateBuilder {
    /// Create a new configuration template builder.
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }

    /// The context version to request.
    ///
    /// By default `3.3` is requested.
    #[inline]
    pub fn with_version(mut self, version: Version) -> Self {
        self.template.version = version;
        self
    }

    /// The context profile to request.
    ///
    /// By default the `Core` profile is requested.
    #[inline]
    pub fn with_profile(mut self, profile: GlProfile) -> Self {
        self.template.profile = profile;
        self
    }

    /// Number of bits for each of the red, green and blue components.
    ///
    /// By default `8` is requested.
    #[inline]
    pub fn with_color_size(mut self, color_size: u8) -> Self {
        self.template.color_size = color_size;
        self
    }

    /// Number of alpha bits in the color buffer.
    ///
    /// By default `8` is requested.
    #[inline]
    pub fn with_alpha_size(mut self, alpha_size: u8) -> Self {
        self.template.alpha_size = alpha_size;
        self
    }

    /// Number of bits in the depth buffer.
    ///
    /// By default `24` is requested.
    #[inline]
    pub fn with_depth_size(mut self, depth_size: u8) -> Self {
        self.template.depth_size = depth_size;
        self
    }

    /// Number of bits in the stencil buffer.
    ///
    /// By default `8` is requested.
    #[inline]
    pub fn with_stencil_size(mut self, stencil_size: u8) -> Self {
        self.template.stencil_size = stencil_size;
        self
    }

    /// Wether the single buffer should be used.
    ///
    /// By default `false` is requested.
    #[inline]
    pub fn with_single_buffering(mut self, single_buffering: bool) -> Self {
        self.template.double_buffer = !single_buffering;
        self
    }

    /// Build the template.
    #[must_use]
    pub fn build(self) -> ConfigTemplate {
        self.template
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_request_core_33_with_depth_and_stencil() {
        let template = ConfigTemplateBuilder::new().build();
        assert_eq!(template.version(), Version::new(3, 3));
        assert_eq!(template.profile(), GlProfile::Core);
        assert!(template.double_buffer());
        assert!(template.depth_size() >= 24);
        assert!(template.stencil_size() >= 8);
        assert_eq!(template.total_color_bits(), 32);
    }

    #[test]
    fn builder_overrides() {
        let template = ConfigTemplateBuilder::new()
            .with_version(Version::new(4, 6))
            .with_profile(GlProfile::Compatibility)
            .with_single_buffering(true)
            .with_depth_size(16)
            .build();

        assert_eq!(template.version(), Version::new(4, 6));
        assert_eq!(template.profile(), GlProfile::Compatibility);
        assert!(!template.double_buffer());
        assert_eq!(template.depth_size(), 16);
        assert!(Version::new(4, 1) > Version::new(3, 3));
    }
}
