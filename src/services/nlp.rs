use regex::Regex;

use crate::models::{ExtractedEntities, Intent};

/// Ordered intent table: the first intent with any keyword contained in the
/// normalized message wins, so earlier rows shadow later ones by design of
/// the table order, not keyword specificity.
pub const DEFAULT_INTENT_KEYWORDS: &[(Intent, &[&str])] = &[
    (
        Intent::Greeting,
        &["hola", "buenos días", "buenas tardes", "buenas noches", "saludos"],
    ),
    (
        Intent::BookAppointment,
        &["cita", "agendar", "reservar", "turno", "hora"],
    ),
    (Intent::Cancel, &["cancelar", "anular", "no", "suspender"]),
    (
        Intent::Confirm,
        &["sí", "si", "confirmar", "ok", "bien", "perfecto", "yes"],
    ),
    (Intent::Change, &["cambiar", "mover", "diferente", "otro"]),
    (
        Intent::Help,
        &["ayuda", "ayudar", "no entiendo", "qué", "cómo"],
    ),
];

pub struct SpecialtyEntry {
    pub code: &'static str,
    pub display_name: &'static str,
    pub keywords: &'static [&'static str],
}

/// Specialty table, disjoint from the intent keywords. Same first-match-wins
/// strategy; also the source of the menu shown to patients.
pub const DEFAULT_SPECIALTIES: &[SpecialtyEntry] = &[
    SpecialtyEntry {
        code: "general",
        display_name: "Medicina General",
        keywords: &["medicina general", "general", "médico general", "doctor general"],
    },
    SpecialtyEntry {
        code: "cardiology",
        display_name: "Cardiología",
        keywords: &["cardiología", "corazón", "cardiólogo", "cardiologia"],
    },
    SpecialtyEntry {
        code: "dermatology",
        display_name: "Dermatología",
        keywords: &["dermatología", "piel", "dermatólogo", "dermatologia"],
    },
    SpecialtyEntry {
        code: "gynecology",
        display_name: "Ginecología",
        keywords: &["ginecología", "ginecólogo", "mujer", "ginecologia"],
    },
    SpecialtyEntry {
        code: "pediatrics",
        display_name: "Pediatría",
        keywords: &["pediatría", "niños", "pediatra", "pediatria"],
    },
    SpecialtyEntry {
        code: "other",
        display_name: "Otros",
        keywords: &["otro", "otra", "diferente", "otros"],
    },
];

pub fn specialty_display_name(code: &str) -> &'static str {
    DEFAULT_SPECIALTIES
        .iter()
        .find(|s| s.code == code)
        .map(|s| s.display_name)
        .unwrap_or("Especialidad Médica")
}

pub struct IntentClassifier {
    table: &'static [(Intent, &'static [&'static str])],
}

impl IntentClassifier {
    pub fn new(table: &'static [(Intent, &'static [&'static str])]) -> Self {
        Self { table }
    }

    pub fn classify(&self, text: &str) -> Intent {
        let normalized = text.trim().to_lowercase();
        for (intent, keywords) in self.table {
            if keywords.iter().any(|k| normalized.contains(k)) {
                return *intent;
            }
        }
        Intent::Unknown
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_INTENT_KEYWORDS)
    }
}

pub struct EntityExtractor {
    specialties: &'static [SpecialtyEntry],
    number: Regex,
    time: Regex,
    date: Regex,
}

impl EntityExtractor {
    pub fn new(specialties: &'static [SpecialtyEntry]) -> Self {
        Self {
            specialties,
            number: Regex::new(r"\d+").expect("static number pattern"),
            time: Regex::new(r"\d{1,2}:\d{2}").expect("static time pattern"),
            date: Regex::new(r"\d{1,2}/\d{1,2}/\d{4}").expect("static date pattern"),
        }
    }

    /// The four passes are independent: a missing specialty does not stop
    /// number/time/date extraction. Number, time and date run over the raw
    /// text; only the specialty pass normalizes case.
    pub fn extract(&self, text: &str) -> ExtractedEntities {
        let normalized = text.trim().to_lowercase();
        let mut entities = ExtractedEntities::default();

        for entry in self.specialties {
            if entry.keywords.iter().any(|k| normalized.contains(k)) {
                entities.specialty = Some(entry.code.to_string());
                break;
            }
        }

        entities.number = self.number.find(text).map(|m| m.as_str().to_string());
        entities.time = self.time.find(text).map(|m| m.as_str().to_string());
        entities.date = self.date.find(text).map(|m| m.as_str().to_string());

        entities
    }
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_SPECIALTIES)
    }
}
