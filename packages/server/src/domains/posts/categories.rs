use serde::{Deserialize, Serialize};

/// Topic a post is classified into.
///
/// Declaration order is the classification tie-break order, so don't reorder
/// the anchored variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Q&A")]
    QAndA,
    News,
    #[serde(rename = "ConnectOS")]
    ConnectOs,
    Hardware,
    /// Fallback when no anchors are available
    Uncategorized,
}

impl Category {
    /// Categories that have an anchor, in tie-break order.
    pub const ANCHORED: [Category; 4] = [
        Category::QAndA,
        Category::News,
        Category::ConnectOs,
        Category::Hardware,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::QAndA => "Q&A",
            Category::News => "News",
            Category::ConnectOs => "ConnectOS",
            Category::Hardware => "Hardware",
            Category::Uncategorized => "Uncategorized",
        }
    }

    /// Prototypical text embedded to produce this category's anchor vector.
    pub fn anchor_description(&self) -> Option<&'static str> {
        match self {
            Category::QAndA => Some(
                "A question asking the community for help: how do I do this, why is \
                 something not working, what is the best way to set it up, can anyone \
                 explain or recommend a fix.",
            ),
            Category::News => Some(
                "An announcement or news update: a new release has shipped, an event is \
                 coming up, a policy changed, the company or industry shared an update \
                 that affects stores.",
            ),
            Category::ConnectOs => Some(
                "Discussion of the ConnectOS software platform: firmware and app updates, \
                 configuration, dashboards, integrations, APIs, logs and software bugs in \
                 the connected store operating system.",
            ),
            Category::Hardware => Some(
                "Discussion of physical store hardware: devices, screens, sensors, \
                 cameras, scanners, gateways, cabling, power, mounting, installation and \
                 broken equipment.",
            ),
            Category::Uncategorized => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "q&a" | "qa" => Ok(Category::QAndA),
            "news" => Ok(Category::News),
            "connectos" => Ok(Category::ConnectOs),
            "hardware" => Ok(Category::Hardware),
            "uncategorized" => Ok(Category::Uncategorized),
            _ => Err(anyhow::anyhow!("Invalid category: {}", s)),
        }
    }
}
