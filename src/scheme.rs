use std::fmt;

/// Color scheme styles understood by the theming tool, in menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum Scheme {
    #[default]
    TonalSpot,
    Content,
    Expressive,
    Fidelity,
    FruitSalad,
    Monochrome,
    Neutral,
    Rainbow,
}

impl Scheme {
    pub const ALL: [Scheme; 8] = [
        Scheme::TonalSpot,
        Scheme::Content,
        Scheme::Expressive,
        Scheme::Fidelity,
        Scheme::FruitSalad,
        Scheme::Monochrome,
        Scheme::Neutral,
        Scheme::Rainbow,
    ];

    /// Identifier passed to the theming tool with `-t`.
    pub fn id(self) -> &'static str {
        match self {
            Scheme::TonalSpot => "scheme-tonal-spot",
            Scheme::Content => "scheme-content",
            Scheme::Expressive => "scheme-expressive",
            Scheme::Fidelity => "scheme-fidelity",
            Scheme::FruitSalad => "scheme-fruit-salad",
            Scheme::Monochrome => "scheme-monochrome",
            Scheme::Neutral => "scheme-neutral",
            Scheme::Rainbow => "scheme-rainbow",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Scheme::TonalSpot => "Tonal Spot",
            Scheme::Content => "Content",
            Scheme::Expressive => "Expressive",
            Scheme::Fidelity => "Fidelity",
            Scheme::FruitSalad => "Fruit Salad",
            Scheme::Monochrome => "Monochrome",
            Scheme::Neutral => "Neutral",
            Scheme::Rainbow => "Rainbow",
        }
    }

    pub fn from_id(id: &str) -> Option<Scheme> {
        Self::ALL.iter().copied().find(|scheme| scheme.id() == id)
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|&s| s == self).unwrap_or(0)
    }

    pub fn next(self) -> Scheme {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Scheme {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
