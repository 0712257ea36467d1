//! Static pattern table mapping raw theme labels to canonical categories.
//!
//! The table is immutable and versioned. Normalizer tiers borrow it; nothing
//! writes to it at runtime.

use serde::Serialize;

/// Main dashboard categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum MainCategory {
    Content,
    Price,
    Delivery,
    CustomerService,
    UserExperience,
    Other,
}

impl MainCategory {
    pub const ALL: [MainCategory; 6] = [
        Self::Content,
        Self::Price,
        Self::Delivery,
        Self::CustomerService,
        Self::UserExperience,
        Self::Other,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Content => "Content",
            Self::Price => "Price",
            Self::Delivery => "Delivery",
            Self::CustomerService => "Customer Service",
            Self::UserExperience => "User Experience",
            Self::Other => "Other",
        }
    }

    /// Display colour for charts.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Content => "#3B82F6",
            Self::Price => "#10B981",
            Self::Delivery => "#F59E0B",
            Self::CustomerService => "#EF4444",
            Self::UserExperience => "#8B5CF6",
            Self::Other => "#6B7280",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// Sub-category used when nothing matches.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// One ordered entry of the pattern table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternEntry {
    pub pattern: &'static str,
    pub main: MainCategory,
    pub sub: &'static str,
    /// Excluded from substring matching.
    pub catch_all: bool,
}

/// A broad keyword family matched by substring after the table tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordGroup {
    pub main: MainCategory,
    pub sub: &'static str,
    pub keywords: &'static [&'static str],
}

/// Versioned, read-only lookup handed to the normalizer.
#[derive(Debug, Clone, Copy)]
pub struct PatternTable {
    pub version: &'static str,
    pub entries: &'static [PatternEntry],
    pub keyword_groups: &'static [KeywordGroup],
}

impl PatternTable {
    /// Built-in Dutch/English table.
    pub fn builtin() -> &'static PatternTable {
        &BUILTIN
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

const fn p(pattern: &'static str, main: MainCategory, sub: &'static str) -> PatternEntry {
    PatternEntry {
        pattern,
        main,
        sub,
        catch_all: false,
    }
}

use MainCategory::{Content, CustomerService, Delivery, Price, UserExperience};

static ENTRIES: &[PatternEntry] = &[
    // Content
    p("content_kwaliteit", Content, "Content Kwaliteit"),
    p("actualiteit", Content, "Actualiteit"),
    p("leesbaarheid", Content, "Leesbaarheid"),
    p("merkvertrouwen", Content, "Merkvertrouwen"),
    p("objectiviteit", Content, "Objectiviteit"),
    p("kwaliteit", Content, "Kwaliteit"),
    p("duurzaamheid", Content, "Duurzaamheid"),
    p("betrouwbaarheid", Content, "Betrouwbaarheid"),
    p("innovatie", Content, "Innovatie"),
    p("communicatie", Content, "Communicatie"),
    p("journalistiek", Content, "Journalistiek"),
    p("inhoud", Content, "Inhoud"),
    p("artikel", Content, "Artikelen"),
    p("nieuws", Content, "Nieuws"),
    p("redactie", Content, "Redactie"),
    p("verhaal", Content, "Verhalen"),
    p("tekst", Content, "Tekst"),
    p("columnisten", Content, "Columnisten"),
    p("columnist", Content, "Columnisten"),
    p("column", Content, "Columns"),
    p("sensatie", Content, "Sensatie"),
    p("drama", Content, "Drama"),
    // Price
    p("pricing", Price, "Prijzen"),
    p("prijs", Price, "Prijs"),
    p("facturering", Price, "Facturering"),
    p("betaling", Price, "Betaling"),
    p("kosten", Price, "Kosten"),
    p("waarde", Price, "Waarde"),
    p("abonnement", Price, "Abonnement"),
    p("tarief", Price, "Tarief"),
    p("betalen", Price, "Betalen"),
    // Delivery
    p("delivery", Delivery, "Bezorging"),
    p("bezorging", Delivery, "Bezorging"),
    p("levertijd", Delivery, "Levertijd"),
    p("verpakking", Delivery, "Verpakking"),
    p("levering", Delivery, "Levering"),
    p("snelheid", Delivery, "Snelheid"),
    p("bezorg", Delivery, "Bezorging"),
    p("post", Delivery, "Post"),
    p("tijd", Delivery, "Tijd"),
    // Customer Service
    p("support", CustomerService, "Support"),
    p("klantenservice", CustomerService, "Klantenservice"),
    p("contact", CustomerService, "Contact"),
    p("reactietijd", CustomerService, "Reactietijd"),
    p("service", CustomerService, "Service"),
    p("hulp", CustomerService, "Hulp"),
    p("medewerkers", CustomerService, "Medewerkers"),
    p("medewerker", CustomerService, "Medewerkers"),
    p("personeel", CustomerService, "Personeel"),
    p("team", CustomerService, "Team"),
    p("klachtenafhandeling", CustomerService, "Klachtenafhandeling"),
    p("klachten", CustomerService, "Klachten"),
    p("klacht", CustomerService, "Klachten"),
    p("afhandeling", CustomerService, "Afhandeling"),
    p("behandeling", CustomerService, "Behandeling"),
    p("reactie", CustomerService, "Reactie"),
    p("respons", CustomerService, "Respons"),
    p("helpdesk", CustomerService, "Helpdesk"),
    p("assistentie", CustomerService, "Assistentie"),
    p("klantvriendelijkheid", CustomerService, "Klantvriendelijkheid"),
    p("klantendienst", CustomerService, "Klantendienst"),
    p("klantgerichtheid", CustomerService, "Klantgerichtheid"),
    p("klantgericht", CustomerService, "Klantgerichtheid"),
    p("klanten", CustomerService, "Klanten"),
    p("klant", CustomerService, "Klant"),
    p("vriendelijkheid", CustomerService, "Vriendelijkheid"),
    p("vriendelijk", CustomerService, "Vriendelijkheid"),
    // User Experience
    p("ux", UserExperience, "Gebruikerservaring"),
    p("interface", UserExperience, "Interface"),
    p("navigatie", UserExperience, "Navigatie"),
    p("gebruiksvriendelijkheid", UserExperience, "Gebruiksvriendelijkheid"),
    p("gebruiksvriendelijk", UserExperience, "Gebruiksvriendelijkheid"),
    p("makkelijk", UserExperience, "Gebruiksgemak"),
    p("moeilijk", UserExperience, "Moeilijkheid"),
    p("design", UserExperience, "Design"),
    p("app", UserExperience, "App Ervaring"),
    p("website", UserExperience, "Website Ervaring"),
    p("platform", UserExperience, "Platform Ervaring"),
    p("gebruikerservaring", UserExperience, "Gebruikerservaring"),
    p("toegankelijkheid", UserExperience, "Toegankelijkheid"),
    p("gebruiksgemak", UserExperience, "Gebruiksgemak"),
    p("gebruikers", UserExperience, "Gebruikers"),
    p("gebruiker", UserExperience, "Gebruikers"),
    p("gebruik", UserExperience, "Gebruik"),
    p("ervaring", UserExperience, "Ervaring"),
    p("interactie", UserExperience, "Interactie"),
    p("bediening", UserExperience, "Bediening"),
    p("functionaliteit", UserExperience, "Functionaliteit"),
    p("vormgeving", UserExperience, "Vormgeving"),
    p("lay-out", UserExperience, "Layout"),
    p("layout", UserExperience, "Layout"),
    p("opmaak", UserExperience, "Opmaak"),
    p("visueel", UserExperience, "Visueel"),
    p("visuele", UserExperience, "Visueel"),
    // Technical problems surface as user experience
    p("technisch", UserExperience, "Technical Issues"),
    p("probleem", UserExperience, "Problems"),
    p("storing", UserExperience, "Technical Issues"),
    p("uitval", UserExperience, "Downtime"),
    p("bug", UserExperience, "Bugs"),
    p("crash", UserExperience, "Crashes"),
    p("werkt niet", UserExperience, "Not Working"),
    p("werkt", UserExperience, "Functionality"),
    // General satisfaction
    p("tevreden", Content, "Tevredenheid"),
    p("blij", Content, "Tevredenheid"),
    p("positief", Content, "Positieve Feedback"),
    p("goed", Content, "Positieve Feedback"),
    p("negatief", Content, "Negatieve Feedback"),
    p("slecht", Content, "Negatieve Feedback"),
    p("ontevreden", Content, "Ontevredenheid"),
    PatternEntry {
        pattern: "overige",
        main: Content,
        sub: "Algemene Feedback",
        catch_all: true,
    },
];

static KEYWORD_GROUPS: &[KeywordGroup] = &[
    KeywordGroup {
        main: Content,
        sub: "Quality",
        keywords: &[
            "kwaliteit",
            "quality",
            "inhoud",
            "content",
            "onderwerp",
            "topic",
            "artikel",
            "column",
            "variatie",
            "analyse",
            "natuur",
            "interview",
            "milieu",
            "gezondheid",
            "diversiteit",
            "onderwijs",
        ],
    },
    KeywordGroup {
        main: Price,
        sub: "Cost",
        keywords: &["prijs", "price", "cost"],
    },
    KeywordGroup {
        main: Delivery,
        sub: "Delivery",
        keywords: &["bezorg", "deliver", "levering"],
    },
    KeywordGroup {
        main: CustomerService,
        sub: "Service",
        keywords: &[
            "service", "support", "help", "klacht", "contact", "reactie", "klant", "customer",
            "vriendelijk",
        ],
    },
    KeywordGroup {
        main: UserExperience,
        sub: "User Experience",
        keywords: &[
            "design",
            "interface",
            "user",
            "gebruiker",
            "ervaring",
            "toegank",
            "gebruik",
            "interactie",
            "bediening",
            "vormgeving",
            "layout",
            "lay-out",
        ],
    },
];

static BUILTIN: PatternTable = PatternTable {
    version: "2024.1",
    entries: ENTRIES,
    keyword_groups: KEYWORD_GROUPS,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catch_all_is_last_and_unique() {
        let table = PatternTable::builtin();
        let catch_alls: Vec<_> = table.entries.iter().filter(|e| e.catch_all).collect();
        assert_eq!(catch_alls.len(), 1);
        assert_eq!(table.entries.last().map(|e| e.pattern), Some("overige"));
    }

    #[test]
    fn test_patterns_are_lowercase_and_unique() {
        let mut seen = HashSet::new();
        for entry in PatternTable::builtin().entries {
            assert_eq!(entry.pattern, entry.pattern.to_lowercase());
            assert!(seen.insert(entry.pattern), "duplicate {}", entry.pattern);
        }
    }

    #[test]
    fn test_category_names_round_trip() {
        for category in MainCategory::ALL {
            assert_eq!(MainCategory::from_name(category.name()), Some(category));
            assert!(category.color().starts_with('#'));
        }
        assert_eq!(MainCategory::from_name("Sports"), None);
    }
}
