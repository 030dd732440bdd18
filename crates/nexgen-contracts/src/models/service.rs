use serde::{Deserialize, Serialize};

/// Service lines offered on the contact form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceType {
    WebDev,
    MobileApps,
    AiSolutions,
    DesignBranding,
    SeoGlobal,
    Ads,
}

impl ServiceType {
    pub const ALL: [ServiceType; 6] = [
        Self::WebDev,
        Self::MobileApps,
        Self::AiSolutions,
        Self::DesignBranding,
        Self::SeoGlobal,
        Self::Ads,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::WebDev => "Desenvolvimento Web",
            Self::MobileApps => "Aplicativos Mobile",
            Self::AiSolutions => "Soluções em IA",
            Self::DesignBranding => "Design & Branding",
            Self::SeoGlobal => "SEO & Internacionalização",
            Self::Ads => "Publicidade Digital",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::WebDev => "web",
            Self::MobileApps => "mobile",
            Self::AiSolutions => "ai",
            Self::DesignBranding => "design",
            Self::SeoGlobal => "seo",
            Self::Ads => "ads",
        }
    }

    /// Accepts either the short slug or the display label.
    pub fn parse(raw: &str) -> Option<Self> {
        let needle = raw.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|service| service.slug() == needle || service.label().to_lowercase() == needle)
    }
}
